use std::path::PathBuf;

use log::info;

use error::{Error, Result};
use purchasable::BloomFilter;

pub mod error;
pub mod export;
pub mod mapping;
pub mod purchasable;
pub mod query;
pub mod table;

/// the ChEMBL SQLite database, as distributed in `chembl_35_sqlite.tar.gz`
pub const DEFAULT_DB_FILENAME: &str = "chembl_35.db";

/// the UniProt to ChEMBL mapping file distributed with each ChEMBL release
pub const DEFAULT_MAPPING_FILENAME: &str = "chembl_uniprot_mapping.txt";

/// a Bloom filter of purchasable compounds built by `build_filter`
pub const DEFAULT_FILTER_FILENAME: &str = "zinc20-instock.bloom";

/// where to find the inputs for a run and where to put the output
#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    pub db: PathBuf,
    pub mapping: PathBuf,
    pub filter: PathBuf,
    /// where to write `<uniprot_id>.csv`. the working directory if unset
    pub output_dir: Option<PathBuf>,
    /// canonicalize SMILES before checking purchasability
    pub canonicalize: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            db: DEFAULT_DB_FILENAME.into(),
            mapping: DEFAULT_MAPPING_FILENAME.into(),
            filter: DEFAULT_FILTER_FILENAME.into(),
            output_dir: None,
            canonicalize: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub path: PathBuf,
    pub records: usize,
    /// the number of purchasable records, if any records were checked
    pub purchasable: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Written(Summary),
    /// there is no single-protein ChEMBL target for the UniProt id
    NotFound,
    /// an input was missing or the database query failed. the reason has
    /// already been reported on stderr
    Halted,
}

/// fetch the ChEMBL activity data for `uniprot_id`, label each compound as
/// purchasable or not, and write the results to `<uniprot_id>.csv` in
/// `opts.output_dir` or the working directory.
///
/// missing input files and database errors are reported on stderr and yield
/// [Outcome::Halted]. any other error, such as an unreadable purchasability
/// filter, is returned to the caller
pub fn process_uniprot_id(
    uniprot_id: &str,
    opts: &Options,
) -> Result<Outcome> {
    match run(uniprot_id, opts) {
        Err(e) if e.is_handled() => {
            match e {
                Error::Database(_) => eprintln!("{e}"),
                _ => eprintln!("Error: {e}"),
            }
            Ok(Outcome::Halted)
        }
        res => res,
    }
}

fn run(uniprot_id: &str, opts: &Options) -> Result<Outcome> {
    if !opts.db.exists() {
        return Err(Error::MissingDatabase(opts.db.clone()));
    }

    let Some(chembl_id) = mapping::get_chembl_id(uniprot_id, &opts.mapping)?
    else {
        println!("No ChEMBL ID found for UniProt {uniprot_id}");
        return Ok(Outcome::NotFound);
    };

    println!(
        "Searching for ChEMBL ID {chembl_id} (from UniProt {uniprot_id})"
    );

    let mut table = query::query_database(&opts.db, &chembl_id)?;

    println!("Found {} records", table.len());

    let mut count = None;
    if !table.is_empty() {
        println!("Checking for purchasable compounds...");
        let filter = BloomFilter::load(&opts.filter)?;
        count = Some(purchasable::annotate(
            &mut table,
            &filter,
            opts.canonicalize,
        )?);
    }

    let dir = opts.output_dir.as_deref();
    let path = export::output_path(dir, uniprot_id);
    export::write_csv(&table, &path)?;
    info!("wrote {} rows for {uniprot_id}", table.len());
    println!("Results written to {}", path.display());

    Ok(Outcome::Written(Summary {
        path,
        records: table.len(),
        purchasable: count,
    }))
}
