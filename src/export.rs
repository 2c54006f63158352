use std::{
    io::Write,
    path::{Path, PathBuf},
};

use log::debug;

use crate::{error::Result, table::ResultTable};

/// the file the results for `uniprot_id` are written to, inside `dir` if
/// given or else as a bare file name relative to the working directory
pub fn output_path(dir: Option<&Path>, uniprot_id: &str) -> PathBuf {
    let name = format!("{uniprot_id}.csv");
    match dir {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// write `table` as comma-separated text with a header row and no index
/// column
pub fn write_table(table: &ResultTable, out: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    wtr.write_record(table.columns())?;
    for record in table.records() {
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// write `table` to `path`, replacing anything already there
pub fn write_csv(table: &ResultTable, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    debug!("writing {} rows to {}", table.len(), path.display());
    let f = std::fs::File::create(path)?;
    write_table(table, f)
}
