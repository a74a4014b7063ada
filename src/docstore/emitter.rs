use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::Record;

/// One retrievable docstore record (§4.4). Newline-delimited JSON: each
/// record is self-delimiting, trivially deterministic to decode, and reuses
/// the `serde_json` dependency already carried for `meta.json`/`idmap.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocLine {
    pub id: u32,
    pub key: String,
    pub title: String,
    pub authors_str: String,
    pub venue: String,
    pub year: Option<i32>,
    pub page_range: Option<String>,
    pub doi: Option<String>,
}

impl DocLine {
    pub fn from_record(id: u32, record: &Record) -> Self {
        DocLine {
            id,
            key: record.key.clone(),
            title: record.title.clone(),
            authors_str: record.authors_str(),
            venue: record.venue.clone(),
            year: record.year,
            page_range: record.page_range.clone(),
            doi: record.doi.clone(),
        }
    }
}

/// Builds the `doc.blob.bin` byte blob and its `doc.index.bin` offset array
/// (length `numDocs + 1`) one record at a time, in id order.
#[derive(Default)]
pub struct DocstoreEmitter {
    blob: Vec<u8>,
    offsets: Vec<u32>,
}

impl DocstoreEmitter {
    pub fn new() -> Self {
        DocstoreEmitter { blob: Vec::new(), offsets: vec![0] }
    }

    pub fn push(&mut self, line: &DocLine) -> Result<()> {
        serde_json::to_writer(&mut self.blob, line)?;
        self.blob.push(b'\n');
        self.offsets.push(self.blob.len() as u32);
        Ok(())
    }

    pub fn finish(self) -> (Vec<u8>, Vec<u32>) {
        (self.blob, self.offsets)
    }
}

/// Decodes the record at `offsets[id]..offsets[id + 1]` out of `blob`.
pub fn decode_at(blob: &[u8], offsets: &[u32], id: u32) -> Result<DocLine> {
    let start = offsets[id as usize] as usize;
    let end = offsets[id as usize + 1] as usize;
    let line = &blob[start..end];
    Ok(serde_json::from_slice(line)?)
}
