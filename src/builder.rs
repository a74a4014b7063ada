use std::collections::HashMap;

use chrono::Utc;
use rayon::prelude::*;
use tracing::info;

use crate::analysis::normalize::normalize;
use crate::analysis::tokenizer::{stopword_set, tokenize};
use crate::core::config::BuildConfig;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{Record, Tier};
use crate::dictionary::builder::{DictionaryBuilder, TermDictionary};
use crate::docstore::emitter::{DocLine, DocstoreEmitter};
use crate::postings::encoder::{encode_field, EncodedField, FieldAccumulator};
use crate::storage::layout::ArtifactLayout;
use crate::storage::packer::ArtifactPacker;

/// Opaque build version stamped into every `meta.json` (§6 "Versioning").
const INDEX_VERSION: &str = "cryptobib-search-v1";

/// Per-record, per-field token streams produced by C1, before the
/// single-threaded dictionary/postings merge of C2/C3 addresses them.
struct RecordTokens {
    title: Vec<String>,
    authors: Vec<String>,
    key: Vec<String>,
    venue: Vec<String>,
    year: Vec<String>,
    doi: Vec<String>,
}

/// Orchestrates the full build pipeline (C1-C5): parallel per-record
/// tokenization, single-threaded dictionary and postings accumulation (in
/// doc-id order, so the result is independent of thread scheduling),
/// docstore emission, and atomic artifact packing.
pub struct IndexBuilder;

impl IndexBuilder {
    pub fn build(records: Vec<Record>, config: &BuildConfig) -> Result<()> {
        let stopwords = stopword_set(&config.extra_stopwords);
        let threads = config.tokenize_threads.unwrap_or_else(num_cpus::get);
        info!(num_records = records.len(), threads, "tokenizing records");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| Error::new(ErrorKind::Internal, e.to_string()))?;
        let tokenized: Vec<RecordTokens> =
            pool.install(|| records.par_iter().map(|r| tokenize_record(r, &stopwords)).collect());

        info!("merging core tier dictionary and postings");
        let (core_dict, core_fields, core_postings) = build_tier_core(&tokenized);

        let layout = ArtifactLayout::new(config.output_dir.clone())?;
        ArtifactPacker::write_tier(
            &layout,
            Tier::Core,
            &core_dict,
            &core_fields,
            &core_postings,
            INDEX_VERSION,
            Some(records.len() as u32),
        )?;

        if config.emit_extended {
            info!("merging extended tier dictionary and postings");
            let (ext_dict, ext_fields, ext_postings) = build_tier_ext(&tokenized);
            ArtifactPacker::write_tier(
                &layout,
                Tier::Ext,
                &ext_dict,
                &ext_fields,
                &ext_postings,
                INDEX_VERSION,
                None,
            )?;
        }

        let mut docstore = DocstoreEmitter::new();
        let mut idmap = HashMap::with_capacity(records.len());
        for (id, record) in records.iter().enumerate() {
            docstore.push(&DocLine::from_record(id as u32, record))?;
            idmap.insert(record.key.clone(), id as u32);
        }
        let (doc_blob, doc_index) = docstore.finish();
        ArtifactPacker::write_docstore(&layout, &doc_index, &doc_blob)?;
        ArtifactPacker::write_idmap(&layout, &idmap)?;

        info!(num_records = records.len(), finished_at = %Utc::now(), "index build complete");
        Ok(())
    }
}

fn tokenize_record(record: &Record, stopwords: &std::collections::HashSet<String>) -> RecordTokens {
    let filter = |text: &str| -> Vec<String> {
        let normalized = normalize(text);
        let (tokens, _) = tokenize(&normalized);
        tokens.into_iter().filter(|t| !stopwords.contains(t)).collect()
    };

    RecordTokens {
        title: filter(&record.title),
        authors: filter(&record.authors_str()),
        key: filter(&record.key),
        venue: filter(&record.venue),
        year: record.year.map(|y| y.to_string()).into_iter().collect(),
        doi: record.doi.as_deref().map(filter).unwrap_or_default(),
    }
}

fn build_tier_core(tokenized: &[RecordTokens]) -> (TermDictionary, Vec<EncodedField>, Vec<u8>) {
    let mut dict_builder = DictionaryBuilder::new();
    let mut title_acc = FieldAccumulator::new_positional();
    let mut authors_acc = FieldAccumulator::new_positional();
    let mut key_acc = FieldAccumulator::new_frequency();

    for (doc_id, rec) in tokenized.iter().enumerate() {
        let doc_id = doc_id as u32;
        for (pos, token) in rec.title.iter().enumerate() {
            let term_id = dict_builder.intern(token);
            title_acc.add_positional(term_id, doc_id, pos as u32);
        }
        for (pos, token) in rec.authors.iter().enumerate() {
            let term_id = dict_builder.intern(token);
            authors_acc.add_positional(term_id, doc_id, pos as u32);
        }
        for token in &rec.key {
            let term_id = dict_builder.intern(token);
            key_acc.add_occurrence(term_id, doc_id);
        }
    }

    let (dict, permutation) = dict_builder.finish();
    let num_terms = dict.len();
    let mut postings = Vec::new();
    let title = encode_field(title_acc, &permutation, num_terms, &mut postings);
    let authors = encode_field(authors_acc, &permutation, num_terms, &mut postings);
    let key = encode_field(key_acc, &permutation, num_terms, &mut postings);

    (dict, vec![title, authors, key], postings)
}

fn build_tier_ext(tokenized: &[RecordTokens]) -> (TermDictionary, Vec<EncodedField>, Vec<u8>) {
    let mut dict_builder = DictionaryBuilder::new();
    let mut venue_acc = FieldAccumulator::new_frequency();
    let mut year_acc = FieldAccumulator::new_frequency();
    let mut doi_acc = FieldAccumulator::new_frequency();

    for (doc_id, rec) in tokenized.iter().enumerate() {
        let doc_id = doc_id as u32;
        for token in &rec.venue {
            let term_id = dict_builder.intern(token);
            venue_acc.add_occurrence(term_id, doc_id);
        }
        for token in &rec.year {
            let term_id = dict_builder.intern(token);
            year_acc.add_occurrence(term_id, doc_id);
        }
        for token in &rec.doi {
            let term_id = dict_builder.intern(token);
            doi_acc.add_occurrence(term_id, doc_id);
        }
    }

    let (dict, permutation) = dict_builder.finish();
    let num_terms = dict.len();
    let mut postings = Vec::new();
    let venue = encode_field(venue_acc, &permutation, num_terms, &mut postings);
    let year = encode_field(year_acc, &permutation, num_terms, &mut postings);
    let doi = encode_field(doi_acc, &permutation, num_terms, &mut postings);

    (dict, vec![venue, year, doi], postings)
}
