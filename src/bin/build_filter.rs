//! build a purchasability filter from a catalog of SMILES, such as the ZINC
//! in-stock subset, for use with `rassay --filter`

use std::{
    fs::File,
    io::{BufRead, BufReader},
    process::ExitCode,
};

use clap::Parser;
use log::info;
use rassay::{
    error::Error,
    purchasable::{canonicalize_smiles, BloomFilter},
    DEFAULT_FILTER_FILENAME,
};

#[derive(Parser)]
struct Cli {
    /// The catalog to read. Each line holds a SMILES string, optionally
    /// followed by whitespace and an identifier. Lines starting with `#` are
    /// skipped.
    catalog: String,

    /// Where to write the filter.
    #[arg(short, long, default_value = DEFAULT_FILTER_FILENAME)]
    output: String,

    /// The target false-positive rate once every catalog entry is inserted.
    #[arg(short, long, default_value_t = 1e-4)]
    fp_rate: f64,

    /// Insert SMILES exactly as written instead of canonicalizing them.
    #[arg(long)]
    no_canonicalize: bool,
}

/// the SMILES on each line of `path`
fn load_catalog(path: &str) -> Result<Vec<String>, Error> {
    let f = File::open(path)?;
    let mut ret = Vec::new();
    for line in BufReader::new(f).lines() {
        let line = line?;
        if line.starts_with('#') {
            continue;
        }
        if let Some(smiles) = line.split_ascii_whitespace().next() {
            ret.push(smiles.to_owned());
        }
    }
    Ok(ret)
}

fn build(cli: &Cli) -> Result<BloomFilter, Error> {
    let smiles = load_catalog(&cli.catalog)?;
    info!("read {} catalog entries from {}", smiles.len(), cli.catalog);
    let mut filter = BloomFilter::with_rate(smiles.len(), cli.fp_rate);
    for s in &smiles {
        if cli.no_canonicalize {
            filter.insert(s);
        } else {
            filter.insert(&canonicalize_smiles(s));
        }
    }
    Ok(filter)
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let res = build(&cli).and_then(|filter| {
        filter.save(&cli.output)?;
        Ok(filter)
    });
    match res {
        Ok(filter) => {
            println!(
                "wrote {} entries to {} ({} bits, {} hashes, \
                expected false-positive rate {:.2e})",
                filter.len(),
                cli.output,
                filter.bits(),
                filter.hashes(),
                filter.false_positive_rate()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
