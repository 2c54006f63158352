use std::path::Path;

use log::{debug, info};
use rusqlite::{Connection, OpenFlags, Row};

use crate::{
    error::{Error, Result},
    table::ResultTable,
};

/// every activity recorded against a ChEMBL target, joined with the document
/// and assay it came from and the structure of the compound tested. the
/// activity has to agree with the assay on both `assay_id` and `doc_id`
pub const ACTIVITY_QUERY: &str = "SELECT
    d.doc_id,
    d.doi,
    d.title,
    a.assay_id,
    a.description,
    cr.compound_key,
    cs.molregno,
    cs.canonical_smiles,
    act.standard_type,
    act.standard_value,
    act.standard_relation,
    act.standard_units,
    act.pchembl_value
FROM
    target_dictionary td
        JOIN
    assays a ON td.tid = a.tid
        JOIN
    docs d ON a.doc_id = d.doc_id
        JOIN
    activities act ON a.assay_id = act.assay_id AND d.doc_id = act.doc_id
        JOIN
    compound_records cr ON act.record_id = cr.record_id
        JOIN
    compound_structures cs ON cr.molregno = cs.molregno
WHERE
    td.chembl_id = ?1";

/// a single row of [ACTIVITY_QUERY]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActivityRow {
    pub doc_id: i64,
    pub doi: Option<String>,
    pub title: Option<String>,
    pub assay_id: i64,
    pub description: Option<String>,
    pub compound_key: Option<String>,
    pub molregno: i64,
    pub canonical_smiles: Option<String>,
    pub standard_type: Option<String>,
    pub standard_value: Option<f64>,
    pub standard_relation: Option<String>,
    pub standard_units: Option<String>,
    pub pchembl_value: Option<f64>,
}

impl ActivityRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            doc_id: row.get(0)?,
            doi: row.get(1)?,
            title: row.get(2)?,
            assay_id: row.get(3)?,
            description: row.get(4)?,
            compound_key: row.get(5)?,
            molregno: row.get(6)?,
            canonical_smiles: row.get(7)?,
            standard_type: row.get(8)?,
            standard_value: row.get(9)?,
            standard_relation: row.get(10)?,
            standard_units: row.get(11)?,
            pchembl_value: row.get(12)?,
        })
    }
}

/// run [ACTIVITY_QUERY] on `conn` for the target `chembl_id`, collecting every
/// row in the order sqlite returns them
pub fn fetch_activities(
    conn: &Connection,
    chembl_id: &str,
) -> rusqlite::Result<Vec<ActivityRow>> {
    let mut stmt = conn.prepare(ACTIVITY_QUERY)?;
    let rows = stmt.query_map([chembl_id], ActivityRow::from_row)?;
    rows.collect()
}

/// open the ChEMBL database at `path` read-only and fetch the activities for
/// `chembl_id`. the connection is closed before returning, whether or not the
/// query succeeded
pub fn query_database(
    path: impl AsRef<Path>,
    chembl_id: &str,
) -> Result<ResultTable> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::MissingDatabase(path.to_owned()));
    }
    debug!("opening {}", path.display());
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    let res = fetch_activities(&conn, chembl_id);
    let closed = conn.close().map_err(|(_conn, e)| e);
    let rows = res?;
    closed?;
    info!("fetched {} activities for {chembl_id}", rows.len());
    Ok(ResultTable::new(rows))
}
