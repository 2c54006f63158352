use std::process::ExitCode;

use clap::Parser;
use log::{debug, info};
use rassay::{
    error::Error, process_uniprot_id, Options, Outcome, DEFAULT_DB_FILENAME,
    DEFAULT_FILTER_FILENAME, DEFAULT_MAPPING_FILENAME,
};

mod config;

/// Fetch ChEMBL assay data for a given UniProt ID and label each compound as
/// purchasable or not.
#[derive(Parser)]
struct Cli {
    /// The UniProt ID to search for.
    uniprot_id: String,

    /// Path to the ChEMBL SQLite database file [default: chembl_35.db]
    #[arg(long)]
    db: Option<String>,

    /// Path to the UniProt to ChEMBL mapping file [default:
    /// chembl_uniprot_mapping.txt]
    #[arg(long)]
    mapping: Option<String>,

    /// Path to the Bloom filter of purchasable compounds, as written by
    /// build_filter [default: zinc20-instock.bloom]
    #[arg(long)]
    filter: Option<String>,

    /// Where to write `<UNIPROT_ID>.csv` [default: the working directory]
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Check SMILES against the filter exactly as stored in ChEMBL, without
    /// canonicalizing them first.
    #[arg(long)]
    no_canonicalize: bool,

    /// A TOML file supplying any of the options above. Command line flags
    /// take precedence.
    #[arg(short, long)]
    config: Option<String>,
}

impl Cli {
    fn options(&self) -> Result<Options, Error> {
        let mut opts = Options::default();
        if let Some(path) = &self.config {
            debug!("loading config from {path}");
            config::Config::load(path)?.apply(&mut opts);
        }
        if let Some(db) = &self.db {
            opts.db = db.into();
        }
        if let Some(mapping) = &self.mapping {
            opts.mapping = mapping.into();
        }
        if let Some(filter) = &self.filter {
            opts.filter = filter.into();
        }
        if let Some(dir) = &self.output_dir {
            opts.output_dir = Some(dir.into());
        }
        if self.no_canonicalize {
            opts.canonicalize = false;
        }
        Ok(opts)
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    debug!(
        "defaults: db = {DEFAULT_DB_FILENAME}, \
        mapping = {DEFAULT_MAPPING_FILENAME}, filter = {DEFAULT_FILTER_FILENAME}"
    );

    let res = cli
        .options()
        .and_then(|opts| process_uniprot_id(&cli.uniprot_id, &opts));
    exit_code(&cli.uniprot_id, res)
}

/// every outcome the pipeline handles itself, including a missing input or a
/// failed query, is a successful exit. only errors it passes back fail
fn exit_code(uniprot_id: &str, res: Result<Outcome, Error>) -> ExitCode {
    match res {
        Ok(outcome) => {
            info!("finished {uniprot_id} with {outcome:?}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
