use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::core::config::EngineConfig;
use crate::core::error::Result;
use crate::core::types::ResultRecord;
use crate::docstore::emitter::decode_at;
use crate::loader::artifact_loader::{ArtifactLoader, CoreTier, Docstore, ExtTier};
use crate::query::matcher::{self, execute};
use crate::query::parser::QueryParser;
use crate::search::results::{RankedHit, TopKCollector};
use crate::storage::layout::ArtifactLayout;

/// Per-call search options (§6). `limit` falls back to the engine's
/// configured `EngineConfig::default_limit` when absent. `use_extended`
/// overrides the heuristic classifier in §4.10.1 when set explicitly.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub limit: Option<usize>,
    pub use_extended: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct EngineStats {
    pub num_docs: u32,
    pub core_terms: u32,
    pub ext_terms: Option<u32>,
    pub extended_loaded: bool,
    pub version: String,
}

/// A loaded, query-ready engine instance (§4.10, §5). Core artifacts are
/// loaded during `init`; the extended tier loads at most once, coalesced
/// under a `parking_lot::RwLock` so concurrent callers share a single load.
pub struct SearchEngine {
    core: CoreTier,
    docstore: Docstore,
    idmap: HashMap<String, u32>,
    ext: RwLock<Option<Arc<ExtTier>>>,
    layout: ArtifactLayout,
    parser: QueryParser,
    default_limit: usize,
}

impl SearchEngine {
    pub fn init(config: EngineConfig) -> Result<Self> {
        let layout = ArtifactLayout::new(config.artifact_root.clone())?;
        info!(root = %config.artifact_root.display(), "loading core artifacts");
        let core = ArtifactLoader::open_core(&layout)?;
        let docstore = ArtifactLoader::open_docstore(&layout)?;
        let idmap = ArtifactLoader::open_idmap(&layout)?;
        info!(num_docs = core.num_docs, "core ready");

        let engine = SearchEngine {
            core,
            docstore,
            idmap,
            ext: RwLock::new(None),
            layout,
            parser: QueryParser::with_extra_stopwords(&config.extra_stopwords),
            default_limit: config.default_limit.clamp(1, 1000),
        };

        if config.eager_load_extended {
            engine.ensure_extended()?;
        }
        Ok(engine)
    }

    fn ensure_extended(&self) -> Result<Arc<ExtTier>> {
        if let Some(ext) = self.ext.read().clone() {
            return Ok(ext);
        }
        let mut guard = self.ext.write();
        if let Some(ext) = guard.clone() {
            return Ok(ext);
        }
        info!("loading extended tier");
        let ext = Arc::new(ArtifactLoader::open_ext(&self.layout)?);
        *guard = Some(ext.clone());
        Ok(ext)
    }

    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<ResultRecord>> {
        let limit = options.limit.unwrap_or(self.default_limit).clamp(1, 1000);
        let parsed = self.parser.parse(query);
        if parsed.is_empty() {
            return Ok(Vec::new());
        }

        let need_ext = options.use_extended.unwrap_or_else(|| matcher::requires_extended(&parsed));
        let ext = if need_ext { Some(self.ensure_extended()?) } else { self.ext.read().clone() };

        let hits = execute(&parsed, &self.core, ext.as_deref())?;

        let mut collector = TopKCollector::new(limit);
        for hit in hits {
            let doc = decode_at(&self.docstore.blob, &self.docstore.offsets, hit.doc_id)?;
            collector.collect(RankedHit {
                doc_id: hit.doc_id,
                score: hit.score,
                year: doc.year.unwrap_or(0),
                title: doc.title,
                key: doc.key,
            });
        }

        collector.into_sorted().into_iter().map(|r| self.materialize(r.doc_id)).collect()
    }

    pub fn get_entry(&self, id_or_key: &str) -> Result<Option<ResultRecord>> {
        let id = self.idmap.get(id_or_key).copied().or_else(|| id_or_key.parse::<u32>().ok());
        let num_docs = self.docstore.offsets.len().saturating_sub(1) as u32;
        match id {
            Some(id) if id < num_docs => Ok(Some(self.materialize(id)?)),
            _ => Ok(None),
        }
    }

    fn materialize(&self, doc_id: u32) -> Result<ResultRecord> {
        let doc = decode_at(&self.docstore.blob, &self.docstore.offsets, doc_id)?;
        Ok(ResultRecord {
            id: doc.id,
            key: doc.key,
            title: doc.title,
            authors_str: doc.authors_str,
            venue: if doc.venue.is_empty() { None } else { Some(doc.venue) },
            year: doc.year,
            page_range: doc.page_range,
            doi: doc.doi,
            highlight: None,
        })
    }

    pub fn stats(&self) -> EngineStats {
        let ext = self.ext.read();
        EngineStats {
            num_docs: self.core.num_docs,
            core_terms: self.core.dict.dict.len() as u32,
            ext_terms: ext.as_deref().map(|e| e.dict.dict.len() as u32),
            extended_loaded: ext.is_some(),
            version: self.core.meta.version.clone(),
        }
    }
}
