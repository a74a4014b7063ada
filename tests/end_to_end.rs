use cryptobib_search::builder::IndexBuilder;
use cryptobib_search::core::config::{BuildConfig, EngineConfig};
use cryptobib_search::core::types::Record;
use cryptobib_search::search::engine::{SearchEngine, SearchOptions};

fn corpus() -> Vec<Record> {
    vec![
        Record {
            key: "K1".into(),
            title: "Authenticated Encryption".into(),
            authors: vec!["Rogaway, P".into()],
            venue: "CCS".into(),
            year: Some(2002),
            page_range: None,
            doi: None,
        },
        Record {
            key: "K2".into(),
            title: "Zero Knowledge Proofs".into(),
            authors: vec!["Bellare, M".into(), "Rogaway, P".into()],
            venue: "CRYPTO".into(),
            year: Some(1993),
            page_range: None,
            doi: None,
        },
        Record {
            key: "K3".into(),
            title: "Authenticated Encryption with Associated Data".into(),
            authors: vec!["Rogaway, P".into()],
            venue: "CCS".into(),
            year: Some(2002),
            page_range: None,
            doi: None,
        },
        Record {
            key: "K4".into(),
            title: "Lattice Signatures".into(),
            authors: vec!["Lyubashevsky, V".into()],
            venue: "EUROCRYPT".into(),
            year: Some(2012),
            page_range: None,
            doi: None,
        },
    ]
}

fn engine() -> SearchEngine {
    let dir = tempfile::tempdir().unwrap();
    let build_config = BuildConfig { output_dir: dir.path().to_path_buf(), ..Default::default() };
    IndexBuilder::build(corpus(), &build_config).unwrap();
    let engine_config = EngineConfig { artifact_root: dir.path().to_path_buf(), ..Default::default() };
    SearchEngine::init(engine_config).unwrap()
}

fn keys(results: &[cryptobib_search::core::types::ResultRecord]) -> Vec<String> {
    results.iter().map(|r| r.key.clone()).collect()
}

#[test]
fn bag_token_in_authors_only_ties_break_by_year_then_title() {
    let engine = engine();
    let results = engine.search("rogaway", &SearchOptions::default()).unwrap();
    assert_eq!(keys(&results), vec!["K1", "K3", "K2"]);
}

#[test]
fn phrase_query_matches_title_occurrences_only() {
    let engine = engine();
    let results = engine.search("\"authenticated encryption\"", &SearchOptions::default()).unwrap();
    assert_eq!(keys(&results), vec!["K1", "K3"]);
}

#[test]
fn trailing_bag_token_matches_by_prefix() {
    let engine = engine();
    let results = engine.search("bella", &SearchOptions::default()).unwrap();
    assert_eq!(keys(&results), vec!["K2"]);
}

#[test]
fn year_token_auto_loads_extended_tier() {
    let engine = engine();
    let before = engine.stats();
    assert!(!before.extended_loaded);
    assert!(before.ext_terms.is_none());
    assert!(before.core_terms > 0);

    let results = engine.search("rogaway 1993", &SearchOptions::default()).unwrap();
    assert_eq!(keys(&results), vec!["K2"]);

    let after = engine.stats();
    assert!(after.extended_loaded);
    assert_eq!(after.core_terms, before.core_terms);
    assert!(after.ext_terms.unwrap() > 0);
}

#[test]
fn no_match_query_is_empty() {
    let engine = engine();
    let results = engine.search("zzz", &SearchOptions::default()).unwrap();
    assert!(results.is_empty());
}

#[test]
fn phrase_plus_bag_token_narrows_to_single_record() {
    let engine = engine();
    let results = engine.search("\"zero knowledge\" rogaway", &SearchOptions::default()).unwrap();
    assert_eq!(keys(&results), vec!["K2"]);
}

#[test]
fn empty_and_whitespace_and_all_stopword_queries_are_empty() {
    let engine = engine();
    for q in ["", "   ", "the a an of"] {
        assert!(engine.search(q, &SearchOptions::default()).unwrap().is_empty());
    }
}

#[test]
fn get_entry_resolves_by_key_and_by_id() {
    let engine = engine();
    let by_key = engine.get_entry("K4").unwrap().expect("K4 exists");
    assert_eq!(by_key.title, "Lattice Signatures");

    let by_id = engine.get_entry(&by_key.id.to_string()).unwrap().expect("id exists");
    assert_eq!(by_id.key, "K4");

    assert!(engine.get_entry("nonexistent").unwrap().is_none());
}

#[test]
fn limit_is_clamped_into_one_to_one_thousand() {
    let engine = engine();
    let options = SearchOptions { limit: Some(0), use_extended: None };
    let results = engine.search("rogaway", &options).unwrap();
    assert_eq!(results.len(), 1);
}

#[test]
fn missing_limit_falls_back_to_the_engines_configured_default() {
    let dir = tempfile::tempdir().unwrap();
    let build_config = BuildConfig { output_dir: dir.path().to_path_buf(), ..Default::default() };
    IndexBuilder::build(corpus(), &build_config).unwrap();
    let engine_config =
        EngineConfig { artifact_root: dir.path().to_path_buf(), default_limit: 2, ..Default::default() };
    let engine = SearchEngine::init(engine_config).unwrap();

    let results = engine.search("rogaway", &SearchOptions::default()).unwrap();
    assert_eq!(results.len(), 2);
}

#[test]
fn configured_extra_stopword_is_ignored_as_filler_not_treated_as_unmatchable() {
    let dir = tempfile::tempdir().unwrap();
    let build_config = BuildConfig {
        output_dir: dir.path().to_path_buf(),
        extra_stopwords: vec!["proceedings".to_string()],
        ..Default::default()
    };
    IndexBuilder::build(corpus(), &build_config).unwrap();
    let engine_config = EngineConfig {
        artifact_root: dir.path().to_path_buf(),
        extra_stopwords: vec!["proceedings".to_string()],
        ..Default::default()
    };
    let engine = SearchEngine::init(engine_config).unwrap();

    // "proceedings" was never indexed (it's an extra stopword at build time);
    // a query containing it alongside a real token must still match on the
    // real token instead of the whole query collapsing to zero results.
    let results = engine.search("proceedings rogaway", &SearchOptions::default()).unwrap();
    assert_eq!(keys(&results), vec!["K1", "K3", "K2"]);
}
