use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::Tier;
use crate::dictionary::builder::TermDictionary;
use crate::postings::encoder::EncodedField;
use crate::storage::layout::ArtifactLayout;

/// `meta.json` contents for one tier (§4.5, plus the integrity fields §4.5
/// explicitly leaves room for).
#[derive(Debug, Serialize, Deserialize)]
pub struct TierMeta {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_docs: Option<u32>,
    pub num_terms: u32,
    pub term_bytes_len: u32,
    pub crc32: u32,
    pub built_at: DateTime<Utc>,
}

/// Writes bit-exact binary artifacts per §4.5, each as a single atomic
/// write-then-rename so a reader never observes a half-written file.
pub struct ArtifactPacker;

impl ArtifactPacker {
    #[allow(clippy::too_many_arguments)]
    pub fn write_tier(
        layout: &ArtifactLayout,
        tier: Tier,
        dict: &TermDictionary,
        fields: &[EncodedField],
        postings: &[u8],
        version: &str,
        num_docs: Option<u32>,
    ) -> Result<()> {
        let mut dict_bytes = Vec::new();
        dict_bytes.extend_from_slice(&(dict.len() as u32).to_le_bytes());
        dict_bytes.extend_from_slice(&(dict.term_blob().len() as u32).to_le_bytes());
        for &offset in dict.term_offsets() {
            dict_bytes.extend_from_slice(&offset.to_le_bytes());
        }
        dict_bytes.extend_from_slice(dict.term_blob());
        write_atomic(&layout.dict_path(tier), &dict_bytes)?;

        let mut ptrs_bytes = Vec::new();
        for field in fields {
            for &v in &field.start {
                ptrs_bytes.extend_from_slice(&v.to_le_bytes());
            }
            for &v in &field.len {
                ptrs_bytes.extend_from_slice(&v.to_le_bytes());
            }
        }
        write_atomic(&layout.ptrs_path(tier), &ptrs_bytes)?;
        write_atomic(&layout.postings_path(tier), postings)?;

        let mut hasher = Hasher::new();
        hasher.update(&dict_bytes);
        hasher.update(&ptrs_bytes);
        hasher.update(postings);

        let meta = TierMeta {
            version: version.to_string(),
            num_docs,
            num_terms: dict.len() as u32,
            term_bytes_len: dict.term_blob().len() as u32,
            crc32: hasher.finalize(),
            built_at: Utc::now(),
        };
        let meta_bytes = serde_json::to_vec_pretty(&meta)?;
        write_atomic(&layout.meta_path(tier), &meta_bytes)?;

        Ok(())
    }

    pub fn write_docstore(layout: &ArtifactLayout, doc_index: &[u32], doc_blob: &[u8]) -> Result<()> {
        let mut idx_bytes = Vec::new();
        for &offset in doc_index {
            idx_bytes.extend_from_slice(&offset.to_le_bytes());
        }
        write_atomic(&layout.doc_index_path(), &idx_bytes)?;
        write_atomic(&layout.doc_blob_path(), doc_blob)?;
        Ok(())
    }

    pub fn write_idmap(layout: &ArtifactLayout, idmap: &HashMap<String, u32>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(idmap)?;
        write_atomic(&layout.idmap_path(), &bytes)?;
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp_name = path.file_name().expect("artifact path has a file name").to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
