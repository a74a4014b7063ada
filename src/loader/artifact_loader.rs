use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::Tier;
use crate::dictionary::builder::TermDictionary;
use crate::storage::layout::ArtifactLayout;
use crate::storage::packer::TierMeta;

/// `[lo, hi)` range of term ids sharing a byte prefix, keyed by the first
/// `min(4, |term|)` characters of each term (§4.6). Built once at load time;
/// never persisted as an artifact.
pub type PrefixMap = HashMap<String, (u32, u32)>;

/// A loaded, validated term dictionary plus its coarse prefix map.
pub struct LoadedDict {
    pub dict: TermDictionary,
    pub prefix_map: PrefixMap,
}

/// Struct-of-arrays pointer table for one field, read back from `ptrs.bin`.
#[derive(Debug, Clone)]
pub struct FieldPointers {
    pub start: Vec<u32>,
    pub len: Vec<u32>,
}

impl FieldPointers {
    pub fn range(&self, term_id: u32) -> Option<(u32, u32)> {
        let len = self.len[term_id as usize];
        if len == 0 {
            return None;
        }
        Some((self.start[term_id as usize], len))
    }
}

pub struct CoreTier {
    pub dict: LoadedDict,
    pub title: FieldPointers,
    pub authors: FieldPointers,
    pub key: FieldPointers,
    pub postings: Arc<Mmap>,
    pub num_docs: u32,
    pub meta: TierMeta,
}

pub struct ExtTier {
    pub dict: LoadedDict,
    pub venue: FieldPointers,
    pub year: FieldPointers,
    pub doi: FieldPointers,
    pub postings: Arc<Mmap>,
    pub meta: TierMeta,
}

pub struct Docstore {
    pub offsets: Vec<u32>,
    pub blob: Arc<Mmap>,
}

/// Acquires and validates tier/docstore/idmap artifacts, exposing typed,
/// read-only views (§4.6). Large byte blobs (`postings.bin`, `doc.blob.bin`)
/// are memory-mapped; the small, alignment-sensitive `u32` arrays
/// (`dict.bin` offsets, `ptrs.bin`, `doc.index.bin`) are copied into owned
/// `Vec<u32>`s, since casting an arbitrarily-aligned mmap byte slice
/// directly to `&[u32]` is unsound.
pub struct ArtifactLoader;

impl ArtifactLoader {
    pub fn open_core(layout: &ArtifactLayout) -> Result<CoreTier> {
        let meta = read_meta(&layout.meta_path(Tier::Core))?;
        let (dict, dict_bytes) = read_dict(&layout.dict_path(Tier::Core), &meta)?;
        let num_terms = dict.dict.len();
        let postings = mmap_file(&layout.postings_path(Tier::Core))?;
        let ptrs_bytes = fs::read(layout.ptrs_path(Tier::Core))?;
        verify_crc32(Tier::Core, &meta, &dict_bytes, &ptrs_bytes, &postings)?;
        let mut cursor = PtrsCursor::new(&ptrs_bytes, num_terms, 3, postings.len())?;
        let title = cursor.next_field()?;
        let authors = cursor.next_field()?;
        let key = cursor.next_field()?;

        let num_docs = meta
            .num_docs
            .ok_or_else(|| Error::load("index.core.meta.json is missing num_docs"))?;

        Ok(CoreTier {
            dict,
            title,
            authors,
            key,
            postings: Arc::new(postings),
            num_docs,
            meta,
        })
    }

    pub fn open_ext(layout: &ArtifactLayout) -> Result<ExtTier> {
        let meta = read_meta(&layout.meta_path(Tier::Ext))?;
        let (dict, dict_bytes) = read_dict(&layout.dict_path(Tier::Ext), &meta)?;
        let num_terms = dict.dict.len();
        let postings = mmap_file(&layout.postings_path(Tier::Ext))?;
        let ptrs_bytes = fs::read(layout.ptrs_path(Tier::Ext))?;
        verify_crc32(Tier::Ext, &meta, &dict_bytes, &ptrs_bytes, &postings)?;
        let mut cursor = PtrsCursor::new(&ptrs_bytes, num_terms, 3, postings.len())?;
        let venue = cursor.next_field()?;
        let year = cursor.next_field()?;
        let doi = cursor.next_field()?;

        Ok(ExtTier { dict, venue, year, doi, postings: Arc::new(postings), meta })
    }

    pub fn open_docstore(layout: &ArtifactLayout) -> Result<Docstore> {
        let idx_bytes = fs::read(layout.doc_index_path())?;
        let offsets = read_u32_array(&idx_bytes)?;
        let blob = mmap_file(&layout.doc_blob_path())?;

        for window in offsets.windows(2) {
            if window[0] > window[1] {
                return Err(Error::load("doc.index.bin offsets are not nondecreasing"));
            }
        }
        if let Some(&last) = offsets.last() {
            if last as usize > blob.len() {
                return Err(Error::load("doc.index.bin offset exceeds doc.blob.bin length"));
            }
        }

        Ok(Docstore { offsets, blob: Arc::new(blob) })
    }

    pub fn open_idmap(layout: &ArtifactLayout) -> Result<HashMap<String, u32>> {
        let bytes = fs::read(layout.idmap_path())?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn mmap_file(path: &Path) -> Result<Mmap> {
    let file = fs::File::open(path)
        .map_err(|e| Error::load(format!("opening {}: {e}", path.display())))?;
    // SAFETY: artifacts are write-once and not concurrently mutated while mapped.
    unsafe { Mmap::map(&file) }.map_err(|e| Error::load(format!("mapping {}: {e}", path.display())))
}

fn read_meta(path: &Path) -> Result<TierMeta> {
    let bytes = fs::read(path).map_err(|e| Error::load(format!("reading {}: {e}", path.display())))?;
    serde_json::from_slice(&bytes).map_err(|e| Error::load(format!("parsing {}: {e}", path.display())))
}

fn read_u32_array(bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        return Err(Error::decode("u32 array length is not a multiple of 4"));
    }
    Ok(bytes.chunks_exact(4).map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect())
}

/// Returns the parsed dictionary plus the raw `dict.bin` bytes (needed by the
/// caller to recompute the tier's `crc32` over `dict.bin ‖ ptrs.bin ‖
/// postings.bin`, matching how `ArtifactPacker::write_tier` hashed them).
fn read_dict(path: &Path, meta: &TierMeta) -> Result<(LoadedDict, Vec<u8>)> {
    let bytes = fs::read(path).map_err(|e| Error::load(format!("reading {}: {e}", path.display())))?;
    if bytes.len() < 8 {
        return Err(Error::load("dict.bin header truncated"));
    }
    let num_terms = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
    let term_bytes_len = u32::from_le_bytes(bytes[4..8].try_into().unwrap());

    if num_terms != meta.num_terms || term_bytes_len != meta.term_bytes_len {
        return Err(Error::load("dict.bin header does not match meta.json"));
    }

    let offsets_start = 8usize;
    let offsets_len = (num_terms as usize + 1) * 4;
    let blob_start = offsets_start + offsets_len;
    let expected_len = blob_start + term_bytes_len as usize;
    if bytes.len() != expected_len {
        return Err(Error::load("dict.bin length does not match its own header"));
    }

    let term_offsets = read_u32_array(&bytes[offsets_start..blob_start])?;
    for window in term_offsets.windows(2) {
        if window[0] > window[1] {
            return Err(Error::load("dict.bin term offsets are not nondecreasing"));
        }
    }
    if term_offsets.last().copied() != Some(term_bytes_len) {
        return Err(Error::load("dict.bin final offset does not match termBytesLen"));
    }

    let term_blob = bytes[blob_start..expected_len].to_vec();
    let dict = TermDictionary::from_parts(term_blob, term_offsets);

    let prefix_map = build_prefix_map(&dict);
    Ok((LoadedDict { dict, prefix_map }, bytes))
}

/// Recomputes the `dict.bin ‖ ptrs.bin ‖ postings.bin` CRC32 and checks it
/// against the value `ArtifactPacker::write_tier` recorded in `meta.json`
/// (§4.5 "additional integrity fields"), catching bit-rot or a partially
/// substituted artifact set that individual length/range checks would miss.
fn verify_crc32(tier: Tier, meta: &TierMeta, dict_bytes: &[u8], ptrs_bytes: &[u8], postings: &[u8]) -> Result<()> {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(dict_bytes);
    hasher.update(ptrs_bytes);
    hasher.update(postings);
    let computed = hasher.finalize();
    if computed != meta.crc32 {
        return Err(Error::load(format!(
            "{} crc32 mismatch: meta.json says {:#010x}, artifacts hash to {:#010x}",
            tier.dir_prefix(),
            meta.crc32,
            computed
        )));
    }
    Ok(())
}

fn build_prefix_map(dict: &TermDictionary) -> PrefixMap {
    let mut map: PrefixMap = HashMap::new();
    let n = dict.len() as u32;
    for id in 0..n {
        let term = dict.term_at(id);
        let key_len = term.chars().take(4).map(char::len_utf8).sum();
        let key = &term[..key_len];
        map.entry(key.to_string())
            .and_modify(|(_, hi)| *hi = id + 1)
            .or_insert((id, id + 1));
    }
    map
}

struct PtrsCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    num_terms: usize,
    postings_len: usize,
}

impl<'a> PtrsCursor<'a> {
    fn new(bytes: &'a [u8], num_terms: usize, num_fields: usize, postings_len: usize) -> Result<Self> {
        let expected = num_terms * 4 * 2 * num_fields;
        if bytes.len() != expected {
            return Err(Error::load("ptrs.bin length does not match numTerms/field count"));
        }
        Ok(PtrsCursor { bytes, pos: 0, num_terms, postings_len })
    }

    fn next_field(&mut self) -> Result<FieldPointers> {
        let span = self.num_terms * 4;
        let start = read_u32_array(&self.bytes[self.pos..self.pos + span])?;
        self.pos += span;
        let len = read_u32_array(&self.bytes[self.pos..self.pos + span])?;
        self.pos += span;

        for (&s, &l) in start.iter().zip(len.iter()) {
            if l > 0 && (s as usize + l as usize) > self.postings_len {
                return Err(Error::load("ptrs.bin entry addresses bytes outside postings.bin"));
            }
        }

        Ok(FieldPointers { start, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::IndexBuilder;
    use crate::core::config::BuildConfig;
    use crate::core::types::Record;

    fn sample_records() -> Vec<Record> {
        vec![Record {
            key: "K1".into(),
            title: "Authenticated Encryption".into(),
            authors: vec!["Rogaway, P".into()],
            venue: "CCS".into(),
            year: Some(2002),
            page_range: None,
            doi: None,
        }]
    }

    #[test]
    fn loads_a_freshly_built_index() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig { output_dir: dir.path().to_path_buf(), ..Default::default() };
        IndexBuilder::build(sample_records(), &config).unwrap();

        let layout = ArtifactLayout::new(dir.path().to_path_buf()).unwrap();
        let core = ArtifactLoader::open_core(&layout).unwrap();
        assert_eq!(core.num_docs, 1);
        assert!(core.dict.dict.contains("authenticated"));

        let ext = ArtifactLoader::open_ext(&layout).unwrap();
        assert!(ext.dict.dict.contains("ccs"));

        let docstore = ArtifactLoader::open_docstore(&layout).unwrap();
        assert_eq!(docstore.offsets.len(), 2);

        let idmap = ArtifactLoader::open_idmap(&layout).unwrap();
        assert_eq!(idmap.get("K1"), Some(&0));
    }

    #[test]
    fn rejects_truncated_dict_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig { output_dir: dir.path().to_path_buf(), ..Default::default() };
        IndexBuilder::build(sample_records(), &config).unwrap();

        let layout = ArtifactLayout::new(dir.path().to_path_buf()).unwrap();
        let path = layout.dict_path(Tier::Core);
        let mut bytes = fs::read(&path).unwrap();
        bytes.truncate(bytes.len() - 1);
        fs::write(&path, bytes).unwrap();

        assert!(ArtifactLoader::open_core(&layout).is_err());
    }

    #[test]
    fn rejects_postings_corrupted_without_touching_lengths() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig { output_dir: dir.path().to_path_buf(), ..Default::default() };
        IndexBuilder::build(sample_records(), &config).unwrap();

        let layout = ArtifactLayout::new(dir.path().to_path_buf()).unwrap();
        let path = layout.postings_path(Tier::Core);
        let mut bytes = fs::read(&path).unwrap();
        if let Some(b) = bytes.first_mut() {
            *b ^= 0xff;
        }
        fs::write(&path, bytes).unwrap();

        let err = ArtifactLoader::open_core(&layout).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Load));
    }
}
