use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use cryptobib_search::builder::IndexBuilder;
use cryptobib_search::core::config::BuildConfig;
use cryptobib_search::core::types::Record;

/// Reads newline-delimited JSON records (one `Record` per line) from a file
/// argument, or from stdin when the argument is `-` or omitted, and builds
/// an index into the given output directory.
///
/// Usage: `build_index [input.jsonl|-] <output_dir>`
fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (input, output_dir) = match args.as_slice() {
        [input, output] => (input.clone(), PathBuf::from(output)),
        [output] => ("-".to_string(), PathBuf::from(output)),
        _ => {
            eprintln!("usage: build_index [input.jsonl|-] <output_dir>");
            return ExitCode::FAILURE;
        }
    };

    let records = match read_records(&input) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("failed to read records: {e}");
            return ExitCode::FAILURE;
        }
    };

    let config = BuildConfig { output_dir, ..Default::default() };
    match IndexBuilder::build(records, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("build failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn read_records(input: &str) -> io::Result<Vec<Record>> {
    let lines: Box<dyn Iterator<Item = io::Result<String>>> = if input == "-" {
        Box::new(BufReader::new(io::stdin()).lines())
    } else {
        Box::new(BufReader::new(File::open(input)?).lines())
    };

    let mut records = Vec::new();
    for line in lines {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(trimmed)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        records.push(record);
    }
    Ok(records)
}
