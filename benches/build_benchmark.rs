use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use cryptobib_search::builder::IndexBuilder;
use cryptobib_search::core::config::BuildConfig;
use cryptobib_search::core::types::Record;
use rand::prelude::*;
use rand::rngs::StdRng;

const VOCAB: &[&str] = &[
    "authenticated", "encryption", "zero", "knowledge", "proof", "lattice", "signature", "hash",
    "cipher", "protocol", "secure", "scheme", "random", "oracle", "key", "exchange", "pairing",
    "elliptic", "curve", "homomorphic",
];

fn synthetic_corpus(n: usize) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n)
        .map(|i| {
            let title = (0..6).map(|_| *VOCAB.choose(&mut rng).unwrap()).collect::<Vec<_>>().join(" ");
            Record {
                key: format!("K{i}"),
                title,
                authors: vec![format!("Author{}, X", i % 500)],
                venue: format!("Venue{}", i % 50),
                year: Some(1980 + (i % 45) as i32),
                page_range: None,
                doi: None,
            }
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let corpus = synthetic_corpus(5_000);
    c.bench_function("build_index_5k_records", |b| {
        b.iter_batched(
            || (corpus.clone(), tempfile::tempdir().unwrap()),
            |(records, dir)| {
                let config = BuildConfig { output_dir: dir.path().to_path_buf(), ..Default::default() };
                IndexBuilder::build(records, &config).unwrap();
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_build);
criterion_main!(benches);
