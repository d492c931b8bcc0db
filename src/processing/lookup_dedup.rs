//! # Lookup-table deduplication
//!
//! Places the OI_WAVELENGTH, OI_ARRAY and OI_CORR tables referenced by the selection into the
//! output file, keeping names unique and collapsing identical tables.
//!
//! For each incoming table, the candidate name starts as the table's own name and the output
//! is probed:
//!
//! ```text
//! LOW  ── free ─────────────────────────────▶ copy as LOW
//!   │
//!   └─ taken ── identical (ReuseIdentical) ─▶ reuse existing LOW
//!        │
//!        └─ different ─▶ LOW_1 ─▶ LOW_2 ─▶ …  (same probe)
//! ```
//!
//! With [`DedupPolicy::AlwaysCopy`] the identity short-circuit is skipped and the table is
//! always copied under the first free name.

use crate::{
    constants::{OI_ARRAY, OI_CORR, OI_WAVELENGTH},
    model::{
        comparator::{compare_table, StrictEq},
        OIArray, OICorr, OIFitsFile, OITable, OIWavelength, TableId,
    },
    oimerge_errors::MergeError,
};

/// A table referenced by name from data tables.
pub trait LookupTable: StrictEq + Clone + Into<OITable> {
    const EXT_NAME: &'static str;

    fn name(&self) -> &str;

    fn rename(&mut self, name: String);

    /// Table of this kind named `name` in `file`.
    fn find<'a>(file: &'a OIFitsFile, name: &str) -> Option<(TableId, &'a Self)>;

    /// View a generic table as this kind.
    fn downcast(table: &OITable) -> Option<&Self>;
}

impl LookupTable for OIWavelength {
    const EXT_NAME: &'static str = OI_WAVELENGTH;

    fn name(&self) -> &str {
        self.ins_name()
    }

    fn rename(&mut self, name: String) {
        self.set_ins_name(name);
    }

    fn find<'a>(file: &'a OIFitsFile, name: &str) -> Option<(TableId, &'a Self)> {
        file.oi_wavelength(name)
    }

    fn downcast(table: &OITable) -> Option<&Self> {
        match table {
            OITable::Wavelength(t) => Some(t),
            _ => None,
        }
    }
}

impl LookupTable for OIArray {
    const EXT_NAME: &'static str = OI_ARRAY;

    fn name(&self) -> &str {
        self.arr_name()
    }

    fn rename(&mut self, name: String) {
        self.set_arr_name(name);
    }

    fn find<'a>(file: &'a OIFitsFile, name: &str) -> Option<(TableId, &'a Self)> {
        file.oi_array(name)
    }

    fn downcast(table: &OITable) -> Option<&Self> {
        match table {
            OITable::Array(t) => Some(t),
            _ => None,
        }
    }
}

impl LookupTable for OICorr {
    const EXT_NAME: &'static str = OI_CORR;

    fn name(&self) -> &str {
        self.corr_name()
    }

    fn rename(&mut self, name: String) {
        self.set_corr_name(name);
    }

    fn find<'a>(file: &'a OIFitsFile, name: &str) -> Option<(TableId, &'a Self)> {
        file.oi_corr(name)
    }

    fn downcast(table: &OITable) -> Option<&Self> {
        match table {
            OITable::Corr(t) => Some(t),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Reuse an output table with identical content.
    ReuseIdentical,
    /// Always copy, under the first free name.
    AlwaysCopy,
}

/// Where an incoming lookup table ended up in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub table: TableId,
    pub name: String,
    /// `true` if an existing output table was reused instead of copying.
    pub reused: bool,
}

/// Place `table` into `output` following `policy`.
///
/// Return
/// ----------
/// * The [`Placement`] of the table. Errors only surface from [`OIFitsFile::add_table`]
///   (e.g. an OI_CORR table added to an OIFITS v1 output).
pub fn place_table<T: LookupTable>(
    output: &mut OIFitsFile,
    table: &T,
    policy: DedupPolicy,
) -> Result<Placement, MergeError> {
    let original = table.name();
    let mut candidate = original.to_string();
    let mut suffix = 0usize;

    loop {
        let probe = T::find(output, &candidate).map(|(id, existing)| {
            (
                id,
                policy == DedupPolicy::ReuseIdentical && compare_table(existing, table),
            )
        });

        match probe {
            None => {
                let mut copy = table.clone();
                copy.rename(candidate.clone());
                let id = output.add_table(copy)?;
                return Ok(Placement {
                    table: id,
                    name: candidate,
                    reused: false,
                });
            }
            Some((id, true)) => {
                return Ok(Placement {
                    table: id,
                    name: candidate,
                    reused: true,
                });
            }
            Some((_, false)) => {
                suffix += 1;
                candidate = format!("{original}_{suffix}");
            }
        }
    }
}
