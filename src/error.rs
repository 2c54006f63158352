use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Can't find mapping file {}", .0.display())]
    MissingMapping(PathBuf),

    #[error("Can't find ChEMBL database file {}", .0.display())]
    MissingDatabase(PathBuf),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// a Bloom filter file that could not be decoded
    #[error("invalid filter: {0}")]
    Filter(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("column has {got} values for a table of {expected} rows")]
    ColumnLength { expected: usize, got: usize },
}

impl Error {
    /// reports whether the pipeline should print `self` and stop processing
    /// the current identifier instead of returning it to the caller. only
    /// missing inputs and failures inside the database engine are handled
    /// this way
    pub fn is_handled(&self) -> bool {
        matches!(
            self,
            Error::MissingMapping(_)
                | Error::MissingDatabase(_)
                | Error::Database(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handled_variants() {
        assert!(Error::MissingMapping("m.txt".into()).is_handled());
        assert!(Error::MissingDatabase("c.db".into()).is_handled());
        assert!(Error::Database(rusqlite::Error::InvalidQuery).is_handled());
        assert!(!Error::Filter("bad magic".into()).is_handled());
        assert!(!Error::ColumnLength { expected: 2, got: 1 }.is_handled());
    }

    #[test]
    fn messages() {
        let e = Error::MissingDatabase("/data/chembl_35.db".into());
        assert_eq!(
            e.to_string(),
            "Can't find ChEMBL database file /data/chembl_35.db"
        );
    }
}
