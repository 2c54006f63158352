use std::{fs::read_to_string, path::Path};

use serde::Deserialize;

use rassay::{error::Error, Options};

/// settings shared between runs, loaded from a TOML file. anything left out
/// falls back to the command line or the built-in defaults
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    /// The ChEMBL SQLite database.
    pub(crate) db: Option<String>,

    /// The UniProt to ChEMBL mapping file.
    pub(crate) mapping: Option<String>,

    /// The Bloom filter of purchasable compounds.
    pub(crate) filter: Option<String>,

    /// The directory to write `<uniprot_id>.csv` into.
    pub(crate) output_dir: Option<String>,

    /// Whether to canonicalize SMILES before checking purchasability.
    pub(crate) canonicalize: Option<bool>,
}

impl Config {
    pub(crate) fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let s = read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&s).map_err(|e| Error::Config(e.to_string()))
    }

    /// fill in `opts` from `self`
    pub(crate) fn apply(self, opts: &mut Options) {
        if let Some(db) = self.db {
            opts.db = db.into();
        }
        if let Some(mapping) = self.mapping {
            opts.mapping = mapping.into();
        }
        if let Some(filter) = self.filter {
            opts.filter = filter.into();
        }
        if let Some(dir) = self.output_dir {
            opts.output_dir = Some(dir.into());
        }
        if let Some(c) = self.canonicalize {
            opts.canonicalize = c;
        }
    }
}
