use crate::{
    error::{Error, Result},
    query::ActivityRow,
};

/// the header of every exported table, in [ActivityRow] field order
pub const COLUMNS: [&str; 13] = [
    "doc_id",
    "doi",
    "title",
    "assay_id",
    "description",
    "compound_key",
    "molregno",
    "canonical_smiles",
    "standard_type",
    "standard_value",
    "standard_relation",
    "standard_units",
    "pchembl_value",
];

pub const PURCHASABLE_COLUMN: &str = "purchasable";

/// the rows returned for a single target, plus the purchasability column once
/// it has been computed
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<ActivityRow>,
    purchasable: Option<Vec<bool>>,
}

impl ResultTable {
    pub fn new(rows: Vec<ActivityRow>) -> Self {
        Self {
            rows,
            purchasable: None,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ActivityRow] {
        &self.rows
    }

    pub fn purchasable(&self) -> Option<&[bool]> {
        self.purchasable.as_deref()
    }

    /// attach the purchasability column. there must be exactly one flag per
    /// row
    pub fn append_purchasable(&mut self, flags: Vec<bool>) -> Result<()> {
        if flags.len() != self.rows.len() {
            return Err(Error::ColumnLength {
                expected: self.rows.len(),
                got: flags.len(),
            });
        }
        self.purchasable = Some(flags);
        Ok(())
    }

    pub fn columns(&self) -> Vec<&'static str> {
        let mut ret = COLUMNS.to_vec();
        if self.purchasable.is_some() {
            ret.push(PURCHASABLE_COLUMN);
        }
        ret
    }

    /// the rendered fields of each row, in [ResultTable::columns] order
    pub fn records(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().enumerate().map(|(i, row)| {
            let mut fields = vec![
                row.doc_id.to_string(),
                text(&row.doi),
                text(&row.title),
                row.assay_id.to_string(),
                text(&row.description),
                text(&row.compound_key),
                row.molregno.to_string(),
                text(&row.canonical_smiles),
                text(&row.standard_type),
                float(row.standard_value),
                text(&row.standard_relation),
                text(&row.standard_units),
                float(row.pchembl_value),
            ];
            if let Some(flags) = &self.purchasable {
                fields.push(boolean(flags[i]).to_owned());
            }
            fields
        })
    }
}

fn text(s: &Option<String>) -> String {
    s.clone().unwrap_or_default()
}

/// floats always carry a decimal point so that integral values like `10.0`
/// stay distinguishable from the integer id columns
fn float(x: Option<f64>) -> String {
    match x {
        Some(x) if x.is_finite() && x.fract() == 0.0 => format!("{x:.1}"),
        Some(x) => x.to_string(),
        None => String::new(),
    }
}

fn boolean(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}
