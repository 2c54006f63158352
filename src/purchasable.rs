//! Purchasability checks against a catalog of commercially available
//! compounds, such as the in-stock subset of ZINC. The catalog is stored as a
//! Bloom filter so that a multi-gigabyte list of SMILES fits in memory, at the
//! cost of a small false-positive rate and no false negatives.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use bloomfilter::Bloom;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, trace};

use crate::{
    error::{Error, Result},
    table::ResultTable,
};

const MAGIC: &[u8; 4] = b"RBLM";
const VERSION: u8 = 2;
/// magic(4) + version(1) + num_hashes(4) + num_bits(8) + item_count(8) +
/// sip_keys(32) + bitmap_len(8)
const HEADER_LEN: usize = 4 + 1 + 4 + 8 + 8 + 32 + 8;

/// anything that can tell us whether a compound can be bought
pub trait Purchasability {
    /// report whether `smiles` is in the catalog, optionally passing it
    /// through [canonicalize_smiles] first
    fn buy(&self, smiles: &str, canonicalize: bool) -> Result<bool>;
}

/// normalize a SMILES string before lookup. without a full cheminformatics
/// toolkit we can only make changes that keep the molecule the same, so this
/// strips surrounding whitespace and leaves stereo markers alone. catalogs
/// have to be built with the same normalization for lookups to hit
pub fn canonicalize_smiles(smiles: &str) -> String {
    smiles.trim().to_owned()
}

pub struct BloomFilter {
    filter: Bloom<str>,
    /// number of items inserted
    n: u64,
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("bits", &self.bits())
            .field("hashes", &self.hashes())
            .field("n", &self.n)
            .finish()
    }
}

impl BloomFilter {
    /// construct a filter sized to hold `capacity` items with a
    /// false-positive rate of `fp_rate`
    pub fn with_rate(capacity: usize, fp_rate: f64) -> Self {
        let fp_rate = fp_rate.clamp(f64::MIN_POSITIVE, 0.5);
        let filter = Bloom::new_for_fp_rate(capacity.max(1), fp_rate);
        debug!(
            "sizing filter for {capacity} items: m = {}, k = {}",
            filter.number_of_bits(),
            filter.number_of_hash_functions()
        );
        Self { filter, n: 0 }
    }

    pub fn len(&self) -> u64 {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn bits(&self) -> u64 {
        self.filter.number_of_bits()
    }

    pub fn hashes(&self) -> u32 {
        self.filter.number_of_hash_functions()
    }

    /// the expected false-positive rate at the current fill
    pub fn false_positive_rate(&self) -> f64 {
        let k = self.hashes() as f64;
        let exponent = -k * self.n as f64 / self.bits() as f64;
        (1.0 - exponent.exp()).powf(k)
    }

    pub fn insert(&mut self, item: &str) {
        self.filter.set(item);
        self.n += 1;
    }

    pub fn contains(&self, item: &str) -> bool {
        self.filter.check(item)
    }

    /// write the filter, including its sip keys so that a reloaded filter
    /// hashes items to the same bits
    pub fn write_to(&self, mut out: impl Write) -> Result<()> {
        let bitmap = self.filter.bitmap();
        let sip_keys = self.filter.sip_keys();
        out.write_all(MAGIC)?;
        out.write_all(&[VERSION])?;
        out.write_all(&self.hashes().to_le_bytes())?;
        out.write_all(&self.bits().to_le_bytes())?;
        out.write_all(&self.n.to_le_bytes())?;
        for (k0, k1) in sip_keys {
            out.write_all(&k0.to_le_bytes())?;
            out.write_all(&k1.to_le_bytes())?;
        }
        out.write_all(&(bitmap.len() as u64).to_le_bytes())?;
        out.write_all(&bitmap)?;
        Ok(())
    }

    pub fn read_from(mut input: impl Read) -> Result<Self> {
        let mut header = [0u8; HEADER_LEN];
        input
            .read_exact(&mut header)
            .map_err(|e| Error::Filter(format!("truncated header: {e}")))?;
        if &header[..4] != MAGIC {
            return Err(Error::Filter("bad magic".to_owned()));
        }
        if header[4] != VERSION {
            return Err(Error::Filter(format!(
                "unsupported version {}",
                header[4]
            )));
        }
        let k = u32::from_le_bytes([header[5], header[6], header[7], header[8]]);
        let m = le_u64(&header[9..17]);
        let n = le_u64(&header[17..25]);
        let sip_keys = [
            (le_u64(&header[25..33]), le_u64(&header[33..41])),
            (le_u64(&header[41..49]), le_u64(&header[49..57])),
        ];
        let bitmap_len = le_u64(&header[57..65]);
        if k == 0 || m == 0 {
            return Err(Error::Filter(format!(
                "empty filter (k = {k}, m = {m})"
            )));
        }
        if bitmap_len != m.div_ceil(8) {
            return Err(Error::Filter(format!(
                "{bitmap_len} byte bitmap for {m} bits"
            )));
        }
        let mut bitmap = Vec::new();
        input.read_to_end(&mut bitmap)?;
        if bitmap.len() as u64 != bitmap_len {
            return Err(Error::Filter(format!(
                "expected {bitmap_len} bytes of bits, found {}",
                bitmap.len()
            )));
        }
        let filter = Bloom::from_existing(&bitmap, m, k, sip_keys);
        Ok(Self { filter, n })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            Error::Filter(format!("failed to open {}: {e}", path.display()))
        })?;
        let ret = Self::read_from(BufReader::new(f))?;
        info!(
            "loaded filter from {} with {} entries",
            path.display(),
            ret.n
        );
        Ok(ret)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_to(&mut out)?;
        out.flush()?;
        Ok(())
    }
}

fn le_u64(b: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(b);
    u64::from_le_bytes(buf)
}

impl Purchasability for BloomFilter {
    fn buy(&self, smiles: &str, canonicalize: bool) -> Result<bool> {
        if canonicalize {
            Ok(self.contains(&canonicalize_smiles(smiles)))
        } else {
            Ok(self.contains(smiles))
        }
    }
}

/// label every row of `table` as purchasable or not, returning the number of
/// purchasable rows. each row is checked on its own, even when several rows
/// share a structure. rows without a SMILES string are never purchasable
pub fn annotate(
    table: &mut ResultTable,
    classifier: &impl Purchasability,
    canonicalize: bool,
) -> Result<usize> {
    let pb = ProgressBar::new(table.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40} {pos}/{len} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut flags = Vec::with_capacity(table.len());
    for row in table.rows() {
        let flag = match &row.canonical_smiles {
            Some(smiles) => classifier.buy(smiles, canonicalize)?,
            None => false,
        };
        trace!("{:?} purchasable: {flag}", row.canonical_smiles);
        flags.push(flag);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let count = flags.iter().filter(|&&f| f).count();
    println!("{count} of {} compounds are purchasable", flags.len());
    table.append_purchasable(flags)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::query::ActivityRow;

    const CATALOG: [&str; 4] = [
        "CC(=O)Oc1ccccc1C(=O)O",
        "c1ccc2ccccc2c1",
        "C[C@H](N)C(=O)O",
        "CCO",
    ];

    fn catalog_filter() -> BloomFilter {
        let mut f = BloomFilter::with_rate(CATALOG.len(), 1e-6);
        for s in CATALOG {
            f.insert(&canonicalize_smiles(s));
        }
        f
    }

    #[test]
    fn canonicalize() {
        assert_eq!(
            canonicalize_smiles(" C[C@@H](N)C(=O)O\n"),
            "C[C@@H](N)C(=O)O"
        );
        assert_eq!(canonicalize_smiles("F/C=C\\F"), "F/C=C\\F");
    }

    #[test]
    fn sizing() {
        let f = BloomFilter::with_rate(1000, 0.01);
        // about 9.6 bits per item and 7 hashes for a 1% rate
        assert!((9585..9600).contains(&f.bits()), "{} bits", f.bits());
        assert!((6..=8).contains(&f.hashes()), "{} hashes", f.hashes());
        assert!(f.is_empty());
    }

    #[test]
    fn membership() {
        let f = catalog_filter();
        assert_eq!(f.len(), 4);
        for s in CATALOG {
            assert!(f.buy(s, true).unwrap(), "{s} missing");
        }
        // surrounding whitespace is the only thing canonicalization removes
        assert!(f.buy(" CCO\n", true).unwrap());
        assert!(!f.buy(" CCO\n", false).unwrap());
        assert!(!f.buy("CCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCC", true).unwrap());
    }

    #[test]
    fn stereoisomers_are_distinct() {
        let mut f = BloomFilter::with_rate(10, 1e-6);
        // L-alanine and trans-1,2-difluoroethene
        f.insert(&canonicalize_smiles("C[C@@H](C(=O)O)N"));
        f.insert(&canonicalize_smiles("F/C=C/F"));
        assert!(f.buy("C[C@@H](C(=O)O)N", true).unwrap());
        assert!(!f.buy("C[C@H](C(=O)O)N", true).unwrap());
        assert!(!f.buy("F/C=C\\F", true).unwrap());
    }

    #[test]
    fn false_positive_rate() {
        let mut f = BloomFilter::with_rate(500, 0.01);
        for i in 0..500 {
            f.insert(&format!("C{i}"));
        }
        assert_abs_diff_eq!(f.false_positive_rate(), 0.01, epsilon = 3e-3);
        let hits = (0..10_000)
            .filter(|i| f.contains(&format!("N{i}")))
            .count();
        assert!(hits < 300, "{hits} false positives");
    }

    #[test]
    fn save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.bloom");
        let f = catalog_filter();
        f.save(&path).unwrap();
        let got = BloomFilter::load(&path).unwrap();
        assert_eq!(got.len(), f.len());
        assert_eq!(got.bits(), f.bits());
        assert_eq!(got.hashes(), f.hashes());
        for s in CATALOG {
            assert!(got.buy(s, true).unwrap(), "{s} missing after reload");
        }
        assert!(!got.buy("c1ccncc1", true).unwrap());

        // the same bytes come back out
        let mut a = Vec::new();
        let mut b = Vec::new();
        f.write_to(&mut a).unwrap();
        got.write_to(&mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn bad_files() {
        let err = BloomFilter::read_from(&b"RBL"[..]).unwrap_err();
        assert!(matches!(err, Error::Filter(_)));

        let mut buf = Vec::new();
        catalog_filter().write_to(&mut buf).unwrap();
        let mut bad_magic = buf.clone();
        bad_magic[0] = b'X';
        let err = BloomFilter::read_from(bad_magic.as_slice()).unwrap_err();
        assert_eq!(err.to_string(), "invalid filter: bad magic");

        buf.pop();
        let err = BloomFilter::read_from(buf.as_slice()).unwrap_err();
        assert!(matches!(err, Error::Filter(_)));

        let dir = tempfile::tempdir().unwrap();
        let err = BloomFilter::load(dir.path().join("nope.bloom")).unwrap_err();
        assert!(!err.is_handled());
    }

    /// records every call so we can check that nothing is deduplicated
    struct Recorder(RefCell<Vec<String>>);

    impl Purchasability for Recorder {
        fn buy(&self, smiles: &str, _canonicalize: bool) -> Result<bool> {
            self.0.borrow_mut().push(smiles.to_owned());
            Ok(smiles.len() % 2 == 0)
        }
    }

    struct Broken;

    impl Purchasability for Broken {
        fn buy(&self, _smiles: &str, _canonicalize: bool) -> Result<bool> {
            Err(Error::Filter("service unavailable".to_owned()))
        }
    }

    fn table(smiles: &[Option<&str>]) -> ResultTable {
        ResultTable::new(
            smiles
                .iter()
                .enumerate()
                .map(|(i, s)| ActivityRow {
                    assay_id: i as i64,
                    canonical_smiles: s.map(str::to_owned),
                    ..Default::default()
                })
                .collect(),
        )
    }

    #[test]
    fn one_flag_per_row() {
        let mut t = table(&[Some("CC"), Some("CCO"), None, Some("CC")]);
        let rec = Recorder(RefCell::new(Vec::new()));
        let got = annotate(&mut t, &rec, true).unwrap();
        assert_eq!(got, 2);
        assert_eq!(
            t.purchasable(),
            Some([true, false, false, true].as_slice())
        );
        assert_eq!(rec.0.into_inner(), vec!["CC", "CCO", "CC"]);
    }

    #[test]
    fn annotate_with_filter() {
        let mut t = table(&[Some("CCO"), Some("CCCl")]);
        let got = annotate(&mut t, &catalog_filter(), true).unwrap();
        assert_eq!(got, 1);
        assert_eq!(t.purchasable(), Some([true, false].as_slice()));
    }

    #[test]
    fn classifier_errors_propagate() {
        let mut t = table(&[Some("CCO")]);
        let err = annotate(&mut t, &Broken, true).unwrap_err();
        assert!(!err.is_handled());
        assert!(t.purchasable().is_none());
    }
}
