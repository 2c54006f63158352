//! UniProt to ChEMBL target lookups backed by the tab-separated mapping file
//! distributed with each ChEMBL release (`chembl_uniprot_mapping.txt`)

use std::path::Path;

use log::{debug, info};
use serde::Deserialize;

use crate::error::{Error, Result};

/// the only target type we resolve to. protein complexes and families share
/// accessions with their single-protein entries, so they are filtered out
pub const SINGLE_PROTEIN: &str = "SINGLE PROTEIN";

/// the number of fields in a well-formed mapping line
const FIELDS: usize = 4;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MappingRecord {
    pub uniprot_id: String,
    pub chembl_id: String,
    pub target_name: String,
    pub target_type: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MappingTable(Vec<MappingRecord>);

impl MappingTable {
    pub fn new(records: Vec<MappingRecord>) -> Self {
        Self(records)
    }

    /// load every record from `path`, keeping file order. lines starting
    /// with `#` are comments, and lines without exactly four fields are
    /// skipped
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::MissingMapping(path.to_owned()));
        }
        let reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .comment(Some(b'#'))
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        Self::from_reader(reader)
    }

    fn from_reader<R: std::io::Read>(
        mut reader: csv::Reader<R>,
    ) -> Result<Self> {
        let mut records = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() != FIELDS {
                debug!(
                    "skipping mapping line {} with {} fields",
                    i + 1,
                    record.len()
                );
                continue;
            }
            records.push(record.deserialize(None)?);
        }
        info!("loaded {} mapping records", records.len());
        Ok(Self(records))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn records(&self) -> &[MappingRecord] {
        &self.0
    }

    pub fn first(&self) -> Option<&MappingRecord> {
        self.0.first()
    }

    pub fn filter(&self, pred: impl Fn(&MappingRecord) -> bool) -> Self {
        Self(self.0.iter().filter(|r| pred(r)).cloned().collect())
    }

    /// return the ChEMBL id of the first single-protein target listed for
    /// `uniprot_id`. when an accession maps to several targets, the earliest
    /// line in the file wins
    pub fn resolve(&self, uniprot_id: &str) -> Option<String> {
        self.filter(|r| {
            r.uniprot_id == uniprot_id && r.target_type == SINGLE_PROTEIN
        })
        .first()
        .map(|r| r.chembl_id.clone())
    }
}

/// load the mapping file at `path` and resolve `uniprot_id` against it
pub fn get_chembl_id(
    uniprot_id: &str,
    path: impl AsRef<Path>,
) -> Result<Option<String>> {
    let table = MappingTable::load(path)?;
    Ok(table.resolve(uniprot_id))
}
