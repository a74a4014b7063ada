/// Complete API demo: build an index from a small in-memory corpus, then
/// run each of the query shapes the engine supports.
use cryptobib_search::builder::IndexBuilder;
use cryptobib_search::core::config::{BuildConfig, EngineConfig};
use cryptobib_search::core::types::Record;
use cryptobib_search::search::engine::{SearchEngine, SearchOptions};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n=== cryptobib-search demo ===\n");

    let dir = std::env::temp_dir().join(format!("cryptobib-demo-{}", std::process::id()));

    println!("Step 1: BUILD - Tokenizing and packing artifacts...");
    let records = sample_corpus();
    let build_config = BuildConfig { output_dir: dir.clone(), ..Default::default() };
    IndexBuilder::build(records, &build_config)?;
    println!("  Wrote artifacts to {}\n", dir.display());

    println!("Step 2: INIT - Loading core artifacts...");
    let engine_config = EngineConfig { artifact_root: dir.clone(), ..Default::default() };
    let engine = SearchEngine::init(engine_config)?;
    let stats = engine.stats();
    println!(
        "  {} documents, {} core terms, extended tier loaded: {}\n",
        stats.num_docs, stats.core_terms, stats.extended_loaded
    );

    println!("Step 3: SEARCH - Plain bag-token query...");
    run_query(&engine, "rogaway", None)?;

    println!("\nStep 4: SEARCH - Phrase query...");
    run_query(&engine, "\"authenticated encryption\"", None)?;

    println!("\nStep 5: SEARCH - Prefix query...");
    run_query(&engine, "bella", None)?;

    println!("\nStep 6: SEARCH - Extended-tier query (auto-loaded by the year token)...");
    run_query(&engine, "rogaway 1993", None)?;
    let after = engine.stats();
    println!(
        "  extended tier loaded now: {} ({} ext terms)",
        after.extended_loaded,
        after.ext_terms.unwrap_or(0)
    );

    println!("\nStep 7: GET ENTRY - Direct key lookup...");
    if let Some(entry) = engine.get_entry("K1")? {
        println!("  K1 -> \"{}\" ({})", entry.title, entry.year.map(|y| y.to_string()).unwrap_or_default());
    }

    std::fs::remove_dir_all(&dir).ok();
    Ok(())
}

fn run_query(engine: &SearchEngine, query: &str, limit: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let options = SearchOptions { limit: Some(limit.unwrap_or(10)), use_extended: None };
    let results = engine.search(query, &options)?;
    println!("  \"{query}\" -> {} result(s)", results.len());
    for r in &results {
        println!("    {} — {} ({})", r.key, r.title, r.year.map(|y| y.to_string()).unwrap_or_default());
    }
    Ok(())
}

fn sample_corpus() -> Vec<Record> {
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
