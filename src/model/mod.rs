//! # OIFITS logical model
//!
//! In-memory rendition of an OIFITS file as consumed and produced by the merge engine.
//! Binary FITS parsing and writing live outside this crate: a reader fills these structures,
//! the merge engine transforms them, and a writer serializes the result.
//!
//! ## Structure
//!
//! ```text
//! OIFitsFile (version V1 | V2)
//! ├── primary_hdu   (Option<OIPrimaryHDU>, V2 only)
//! └── tables        (arena, addressed by TableId)
//!     ├── OI_TARGET      exactly one, maps local TARGET_ID → Target
//!     ├── OI_WAVELENGTH  named by INSNAME
//!     ├── OI_ARRAY       named by ARRNAME
//!     ├── OI_CORR        named by CORRNAME (V2 only)
//!     └── OI_VIS / OI_VIS2 / OI_T3 / OI_FLUX  data tables referencing the above by name
//! ```
//!
//! ## Handles
//!
//! Tables are stored in a flat arena and referenced through [`TableId`] handles instead of
//! references, so mapping tables built during a merge are plain `handle → handle` lookups.
//! Handles are stable: tables are only ever appended.
//!
//! ## See also
//! ------------
//! * [`comparator`] – Strict structural comparison of lookup tables.
//! * [`night_id`] – Observation night identifiers and matcher.
//! * [`crate::collection`] – Multi-file collection and selection inputs.

pub mod comparator;
pub mod night_id;
pub mod oi_array;
pub mod oi_corr;
pub mod oi_data;
pub mod oi_target;
pub mod oi_wavelength;

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    constants::{KEYWORD_CONTENT_OIFITS2, OI_ARRAY, OI_CORR, OI_TARGET, OI_WAVELENGTH},
    oimerge_errors::MergeError,
};

pub use night_id::{NightId, NightIdMatcher};
pub use oi_array::{OIArray, Station};
pub use oi_corr::OICorr;
pub use oi_data::{ColumnValues, DataColumn, OIData, OIDataKind};
pub use oi_target::{OITarget, Target, TargetEntry};
pub use oi_wavelength::OIWavelength;

/// Free-form header keywords not covered by the typed fields of a table.
pub type Keywords = BTreeMap<String, KeywordValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum KeywordValue {
    Str(String),
    Int(i64),
    Real(f64),
    Bool(bool),
}

/// OIFITS standard revision of a file.
///
/// Variants are ordered, so the highest revision of a set of files is simply their maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OIFitsStandard {
    #[serde(rename = "V1")]
    Version1,
    #[serde(rename = "V2")]
    Version2,
}

impl OIFitsStandard {
    /// Whether OI_CORR tables are legal in this revision.
    pub fn supports_corr(&self) -> bool {
        matches!(self, OIFitsStandard::Version2)
    }

    /// Highest revision among the given ones, [`OIFitsStandard::Version1`] if there is none.
    pub fn highest<I>(versions: I) -> OIFitsStandard
    where
        I: IntoIterator<Item = OIFitsStandard>,
    {
        versions
            .into_iter()
            .max()
            .unwrap_or(OIFitsStandard::Version1)
    }
}

impl fmt::Display for OIFitsStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OIFitsStandard::Version1 => write!(f, "OIFITS v1"),
            OIFitsStandard::Version2 => write!(f, "OIFITS v2"),
        }
    }
}

/// Primary header of an OIFITS v2 file.
#[derive(Debug, Clone, PartialEq)]
pub struct OIPrimaryHDU {
    pub content: String,
    pub keywords: Keywords,
}

impl OIPrimaryHDU {
    pub fn oifits2() -> Self {
        OIPrimaryHDU {
            content: KEYWORD_CONTENT_OIFITS2.to_string(),
            keywords: Keywords::new(),
        }
    }
}

/// Handle of a table inside one [`OIFitsFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub(crate) usize);

impl TableId {
    /// Handle of the `index`-th table (0-based).
    pub fn from_index(index: usize) -> Self {
        TableId(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OITable {
    Target(OITarget),
    Wavelength(OIWavelength),
    Array(OIArray),
    Corr(OICorr),
    Data(OIData),
}

impl OITable {
    /// FITS extension name of the table.
    pub fn ext_name(&self) -> &'static str {
        match self {
            OITable::Target(_) => OI_TARGET,
            OITable::Wavelength(_) => OI_WAVELENGTH,
            OITable::Array(_) => OI_ARRAY,
            OITable::Corr(_) => OI_CORR,
            OITable::Data(data) => data.kind().ext_name(),
        }
    }

    pub fn as_data(&self) -> Option<&OIData> {
        match self {
            OITable::Data(data) => Some(data),
            _ => None,
        }
    }
}

impl From<OITarget> for OITable {
    fn from(t: OITarget) -> Self {
        OITable::Target(t)
    }
}

impl From<OIWavelength> for OITable {
    fn from(t: OIWavelength) -> Self {
        OITable::Wavelength(t)
    }
}

impl From<OIArray> for OITable {
    fn from(t: OIArray) -> Self {
        OITable::Array(t)
    }
}

impl From<OICorr> for OITable {
    fn from(t: OICorr) -> Self {
        OITable::Corr(t)
    }
}

impl From<OIData> for OITable {
    fn from(t: OIData) -> Self {
        OITable::Data(t)
    }
}

impl fmt::Display for OITable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OITable::Target(t) => write!(f, "{OI_TARGET}[{} targets]", t.len()),
            OITable::Wavelength(t) => write!(f, "{OI_WAVELENGTH}[{}]", t.ins_name()),
            OITable::Array(t) => write!(f, "{OI_ARRAY}[{}]", t.arr_name()),
            OITable::Corr(t) => write!(f, "{OI_CORR}[{}]", t.corr_name()),
            OITable::Data(t) => write!(f, "{t}"),
        }
    }
}

/// One OIFITS file: an ordered arena of tables plus an optional primary header.
#[derive(Debug, Clone)]
pub struct OIFitsFile {
    version: OIFitsStandard,
    file_name: Option<String>,
    primary_hdu: Option<OIPrimaryHDU>,
    tables: Vec<OITable>,
}

impl OIFitsFile {
    pub fn new(version: OIFitsStandard) -> Self {
        OIFitsFile {
            version,
            file_name: None,
            primary_hdu: None,
            tables: Vec::new(),
        }
    }

    /// Attach the name of the file this instance was read from (diagnostics only).
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn version(&self) -> OIFitsStandard {
        self.version
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn primary_hdu(&self) -> Option<&OIPrimaryHDU> {
        self.primary_hdu.as_ref()
    }

    pub fn set_primary_hdu(&mut self, hdu: OIPrimaryHDU) {
        self.primary_hdu = Some(hdu);
    }

    /// Append a table to the file and return its handle.
    ///
    /// Return
    /// ----------
    /// * The new [`TableId`], or a [`MergeError`] if the table breaks the file invariants:
    ///   a second OI_TARGET, an OI_CORR in an OIFITS v1 file, or a lookup table whose name is
    ///   already used by another table of the same kind.
    pub fn add_table(&mut self, table: impl Into<OITable>) -> Result<TableId, MergeError> {
        let table = table.into();

        match &table {
            OITable::Target(_) if self.oi_target().is_some() => {
                return Err(MergeError::MultipleTargetTables);
            }
            OITable::Corr(_) if !self.version.supports_corr() => {
                return Err(MergeError::UnsupportedTable {
                    ext_name: OI_CORR,
                    version: self.version,
                });
            }
            _ => {}
        }

        let duplicate = match &table {
            OITable::Wavelength(t) => self
                .oi_wavelength(t.ins_name())
                .map(|_| t.ins_name().to_string()),
            OITable::Array(t) => self.oi_array(t.arr_name()).map(|_| t.arr_name().to_string()),
            OITable::Corr(t) => self.oi_corr(t.corr_name()).map(|_| t.corr_name().to_string()),
            _ => None,
        };
        if let Some(name) = duplicate {
            return Err(MergeError::DuplicateTableName {
                ext_name: table.ext_name(),
                name,
            });
        }

        self.tables.push(table);
        Ok(TableId(self.tables.len() - 1))
    }

    pub fn table(&self, id: TableId) -> Option<&OITable> {
        self.tables.get(id.0)
    }

    pub fn tables(&self) -> impl Iterator<Item = (TableId, &OITable)> {
        self.tables
            .iter()
            .enumerate()
            .map(|(idx, table)| (TableId(idx), table))
    }

    pub fn nb_tables(&self) -> usize {
        self.tables.len()
    }

    pub fn oi_target(&self) -> Option<&OITarget> {
        self.tables.iter().find_map(|t| match t {
            OITable::Target(target) => Some(target),
            _ => None,
        })
    }

    pub fn oi_wavelength(&self, ins_name: &str) -> Option<(TableId, &OIWavelength)> {
        self.tables().find_map(|(id, t)| match t {
            OITable::Wavelength(w) if w.ins_name() == ins_name => Some((id, w)),
            _ => None,
        })
    }

    pub fn oi_array(&self, arr_name: &str) -> Option<(TableId, &OIArray)> {
        self.tables().find_map(|(id, t)| match t {
            OITable::Array(a) if a.arr_name() == arr_name => Some((id, a)),
            _ => None,
        })
    }

    pub fn oi_corr(&self, corr_name: &str) -> Option<(TableId, &OICorr)> {
        self.tables().find_map(|(id, t)| match t {
            OITable::Corr(c) if c.corr_name() == corr_name => Some((id, c)),
            _ => None,
        })
    }

    pub fn oi_datas(&self) -> impl Iterator<Item = (TableId, &OIData)> {
        self.tables()
            .filter_map(|(id, t)| t.as_data().map(|data| (id, data)))
    }

    pub fn oi_data(&self, id: TableId) -> Option<&OIData> {
        self.table(id).and_then(OITable::as_data)
    }

    /// INSNAME values of the OI_WAVELENGTH tables, in file order.
    pub fn accepted_ins_names(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter_map(|t| match t {
                OITable::Wavelength(w) => Some(w.ins_name()),
                _ => None,
            })
            .collect()
    }

    pub fn accepted_arr_names(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter_map(|t| match t {
                OITable::Array(a) => Some(a.arr_name()),
                _ => None,
            })
            .collect()
    }

    pub fn accepted_corr_names(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter_map(|t| match t {
                OITable::Corr(c) => Some(c.corr_name()),
                _ => None,
            })
            .collect()
    }
}

/// Structural equality: the file name is a diagnostic label and does not take part.
impl PartialEq for OIFitsFile {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.primary_hdu == other.primary_hdu
            && self.tables == other.tables
    }
}

impl fmt::Display for OIFitsFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OIFitsFile[{}]({} tables)",
            self.file_name.as_deref().unwrap_or("<memory>"),
            self.tables.len()
        )
    }
}

#[cfg(test)]
mod oifits_file_test {
    use super::*;

    #[test]
    fn test_highest_version() {
        assert_eq!(OIFitsStandard::highest([]), OIFitsStandard::Version1);
        assert_eq!(
            OIFitsStandard::highest([OIFitsStandard::Version1, OIFitsStandard::Version2]),
            OIFitsStandard::Version2
        );
        assert!(!OIFitsStandard::Version1.supports_corr());
        assert!(OIFitsStandard::Version2.supports_corr());
    }

    #[test]
    fn test_add_table_invariants() {
        let mut file = OIFitsFile::new(OIFitsStandard::Version1);

        file.add_table(OITarget::new()).unwrap();
        assert_eq!(
            file.add_table(OITarget::new()),
            Err(MergeError::MultipleTargetTables)
        );

        let id = file
            .add_table(OIWavelength::new("LOW", vec![2.0e-6], vec![1.0e-7]))
            .unwrap();
        assert_eq!(file.oi_wavelength("LOW").map(|(id, _)| id), Some(id));
        assert_eq!(
            file.add_table(OIWavelength::new("LOW", vec![2.2e-6], vec![1.0e-7])),
            Err(MergeError::DuplicateTableName {
                ext_name: OI_WAVELENGTH,
                name: "LOW".into()
            })
        );

        assert_eq!(
            file.add_table(OICorr::new("C1", 2, vec![1], vec![2], vec![0.5])),
            Err(MergeError::UnsupportedTable {
                ext_name: OI_CORR,
                version: OIFitsStandard::Version1
            })
        );
        assert_eq!(file.accepted_ins_names(), vec!["LOW"]);
        assert_eq!(file.nb_tables(), 2);
    }

    #[test]
    fn test_equality_ignores_file_name() {
        let a = OIFitsFile::new(OIFitsStandard::Version2).with_file_name("a.fits");
        let b = OIFitsFile::new(OIFitsStandard::Version2);
        assert_eq!(a, b);
        assert_eq!(a.file_name(), Some("a.fits"));
    }
}
