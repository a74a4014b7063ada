use std::fs;
use std::path::PathBuf;

use crate::core::error::Result;
use crate::core::types::Tier;

/// Fixed artifact filenames under a single flat root directory (§6). Unlike
/// the segmented, per-generation layout a mutable index would need, this
/// index is a single write-once build, so the path builder collapses to one
/// directory with a handful of named files.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    pub root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(ArtifactLayout { root })
    }

    pub fn meta_path(&self, tier: Tier) -> PathBuf {
        self.root.join(format!("{}.meta.json", tier.dir_prefix()))
    }

    pub fn dict_path(&self, tier: Tier) -> PathBuf {
        self.root.join(format!("{}.dict.bin", tier.dir_prefix()))
    }

    pub fn ptrs_path(&self, tier: Tier) -> PathBuf {
        self.root.join(format!("{}.ptrs.bin", tier.dir_prefix()))
    }

    pub fn postings_path(&self, tier: Tier) -> PathBuf {
        self.root.join(format!("{}.postings.bin", tier.dir_prefix()))
    }

    pub fn doc_index_path(&self) -> PathBuf {
        self.root.join("doc.index.bin")
    }

    pub fn doc_blob_path(&self) -> PathBuf {
        self.root.join("doc.blob.bin")
    }

    pub fn idmap_path(&self) -> PathBuf {
        self.root.join("idmap.json")
    }
}
