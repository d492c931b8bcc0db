//! # Merge diagnostics
//!
//! A merge absorbs every per-table and per-row problem: the output simply holds fewer tables
//! or fewer rows. [`MergeReport`] records each of those conditions as a [`Diagnostic`] so a
//! caller can tell a clean merge from a degraded one without re-inspecting the output.
//!
//! Every diagnostic is also emitted as a `tracing` event by the merge engine; the report is the
//! structured copy of those events.

use std::fmt;

use crate::{
    collection::{FileId, TableRef},
    constants::TargetId,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// The INSNAME of a data table has no OI_WAVELENGTH counterpart: the table is skipped.
    ReferenceUnresolvable { table: TableRef, ins_name: String },
    /// An ARRNAME or CORRNAME reference could not be mapped: the table is kept with
    /// `substitute` in place of the reference (`None` removes the reference).
    ReferenceDegraded {
        table: TableRef,
        ext_name: &'static str,
        name: String,
        substitute: Option<String>,
    },
    /// A TARGET_ID of `file` has no selected target; its rows are removed.
    ExtraTargetId { file: FileId, target_id: TargetId },
    /// Rows of a data table were removed (extra target or unselected night).
    RowsFiltered {
        table: TableRef,
        kept: usize,
        total: usize,
    },
    /// Every row of a data table was removed: the table is not written.
    TableDropped { table: TableRef },
    /// A lookup table was identical to an output table and reuses it.
    IdenticalTable {
        ext_name: &'static str,
        table: TableRef,
        output_name: String,
    },
}

impl Diagnostic {
    /// Whether the condition changed the shape of the output.
    pub fn is_degradation(&self) -> bool {
        !matches!(self, Diagnostic::IdenticalTable { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ReferenceUnresolvable { table, ins_name } => {
                write!(f, "{table}: invalid INSNAME[{ins_name}], table skipped")
            }
            Diagnostic::ReferenceDegraded {
                table,
                ext_name,
                name,
                substitute,
            } => write!(
                f,
                "{table}: invalid {ext_name} reference [{name}], using [{}]",
                substitute.as_deref().unwrap_or("none")
            ),
            Diagnostic::ExtraTargetId { file, target_id } => {
                write!(f, "file #{}: extra TARGET_ID {target_id}", file.index())
            }
            Diagnostic::RowsFiltered { table, kept, total } => {
                write!(f, "{table}: kept {kept} of {total} rows")
            }
            Diagnostic::TableDropped { table } => write!(f, "{table}: no remaining row, dropped"),
            Diagnostic::IdenticalTable {
                ext_name,
                table,
                output_name,
            } => write!(f, "{table}: same {ext_name} as [{output_name}]"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    diagnostics: Vec<Diagnostic>,
}

impl MergeReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// True when no diagnostic altered the output.
    pub fn is_clean(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_degradation)
    }

    pub fn count<P>(&self, predicate: P) -> usize
    where
        P: Fn(&Diagnostic) -> bool,
    {
        self.diagnostics.iter().filter(|d| predicate(d)).count()
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MergeReport ({} diagnostics)", self.diagnostics.len())?;
        for d in &self.diagnostics {
            writeln!(f, "  - {d}")?;
        }
        Ok(())
    }
}
