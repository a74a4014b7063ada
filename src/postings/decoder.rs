use crate::core::error::{Error, ErrorKind, Result};
use crate::postings::varint::decode_u32;

/// Decodes a positional posting list: `(docDelta, nPos, posDelta*)` per doc,
/// producing `(doc_id, positions)` pairs sorted by `doc_id` ascending with
/// `positions` strictly increasing. Consumes exactly `bytes.len()` bytes or
/// fails.
pub fn decode_positional(bytes: &[u8]) -> Result<Vec<(u32, Vec<u32>)>> {
    let mut out = Vec::new();
    let mut pos = 0usize;
    let mut prev_doc = 0u32;

    while pos < bytes.len() {
        let (doc_delta, c) = decode_u32(&bytes[pos..])?;
        pos += c;
        let doc_id = checked_add(prev_doc, doc_delta)?;
        prev_doc = doc_id;

        let (n_pos, c) = decode_u32(&bytes[pos..])?;
        pos += c;

        let mut positions = Vec::with_capacity(n_pos as usize);
        let mut prev_pos = 0u32;
        for _ in 0..n_pos {
            let (delta, c) = decode_u32(&bytes[pos..])?;
            pos += c;
            let p = checked_add(prev_pos, delta)?;
            prev_pos = p;
            positions.push(p);
        }
        out.push((doc_id, positions));
    }

    if pos != bytes.len() {
        return Err(Error::new(
            ErrorKind::Decode,
            "positional posting list did not consume exactly its declared length",
        ));
    }

    Ok(out)
}

/// Decodes a frequency-only posting list: `(docDelta, tf)` per doc.
pub fn decode_frequency(bytes: &[u8]) -> Result<Vec<(u32, u32)>> {
    let mut out = Vec::new();
    let mut pos = 0usize;
    let mut prev_doc = 0u32;

    while pos < bytes.len() {
        let (doc_delta, c) = decode_u32(&bytes[pos..])?;
        pos += c;
        let doc_id = checked_add(prev_doc, doc_delta)?;
        prev_doc = doc_id;

        let (tf, c) = decode_u32(&bytes[pos..])?;
        pos += c;

        out.push((doc_id, tf));
    }

    if pos != bytes.len() {
        return Err(Error::new(
            ErrorKind::Decode,
            "frequency posting list did not consume exactly its declared length",
        ));
    }

    Ok(out)
}

fn checked_add(a: u32, b: u32) -> Result<u32> {
    a.checked_add(b)
        .ok_or_else(|| Error::new(ErrorKind::Decode, "posting delta overflowed u32"))
}
