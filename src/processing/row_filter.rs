//! # Row filtering and compaction
//!
//! A data table goes through two phases:
//!
//! 1. [`plan_rows`] inspects the table against the identifier mapping of its file and the
//!    selected nights, and decides which rows survive and which TARGET_ID they carry. Nothing
//!    is copied yet.
//! 2. [`materialize`] builds the output table from the plan in one go: lookup names replaced,
//!    rows compacted, TARGET_ID rewritten. A plan that keeps no row produces no table.
//!
//! Rows are removed when their TARGET_ID has no selected target or when their night is not
//! selected (unless the table lies on a single selected night, which needs no per-row check).

use tracing::{debug, warn};

use crate::{
    collection::{FileId, TableRef},
    constants::TargetId,
    model::{NightId, NightIdMatcher, OIData},
    oimerge_errors::MergeError,
};

use super::{
    id_remapper::{IdRemapper, Resolution},
    report::{Diagnostic, MergeReport},
};

#[derive(Debug, Clone, PartialEq)]
pub enum RowPlan {
    /// Every row survives; `target_id` is the renumbered column, `None` if unchanged.
    KeepAll { target_id: Option<Vec<TargetId>> },
    /// Only `rows` (ascending) survive, with the matching renumbered TARGET_ID values.
    Compact {
        rows: Vec<usize>,
        target_id: Vec<TargetId>,
    },
    /// No row survives.
    DropAll,
}

/// Lookup-table names written to a materialized data table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNames {
    pub ins_name: String,
    pub arr_name: String,
    pub corr_name: Option<String>,
}

/// Decide which rows of `data` survive the merge.
///
/// Extra identifiers met for the first time in `file` are memoized in `remapper`, logged and
/// reported once.
pub fn plan_rows(
    table: TableRef,
    data: &OIData,
    file: FileId,
    remapper: &mut IdRemapper<FileId, TargetId>,
    nights: &NightIdMatcher,
    report: &mut MergeReport,
) -> RowPlan {
    let mut check_target_id = false;
    for id in data.distinct_target_ids() {
        match remapper.resolve(file, id) {
            Resolution::Extra => {
                check_target_id = true;
                warn!(
                    file = file.index(),
                    target_id = id,
                    substitute = remapper.undefined(),
                    "extra TARGET_ID found, its rows will be removed"
                );
                report.push(Diagnostic::ExtraTargetId {
                    file,
                    target_id: id,
                });
            }
            Resolution::Mapped(new_id) if new_id != id => check_target_id = true,
            Resolution::Mapped(_) => {}
        }
    }

    let check_night_id = match data.single_night() {
        Some(night) => !nights.matches(night),
        None => !nights.matches_all(data.distinct_night_ids()),
    };
    debug!(%table, check_target_id, check_night_id, "row checks");

    if !check_target_id && !check_night_id {
        return RowPlan::KeepAll { target_id: None };
    }

    let night_ids: Vec<NightId> = if check_night_id {
        data.night_ids()
    } else {
        Vec::new()
    };

    let mut rows = Vec::with_capacity(data.nb_rows());
    let mut target_id = Vec::with_capacity(data.nb_rows());
    for (i, &old_id) in data.target_id().iter().enumerate() {
        let new_id = if check_target_id {
            remapper.get_or_undefined(file, old_id)
        } else {
            old_id
        };
        let night_ok = !check_night_id || nights.matches(night_ids[i]);

        if night_ok && !remapper.is_undefined(new_id) {
            rows.push(i);
            target_id.push(new_id);
        }
    }

    let total = data.nb_rows();
    if rows.is_empty() {
        warn!(%table, "no remaining row, table skipped");
        report.push(Diagnostic::TableDropped { table });
        RowPlan::DropAll
    } else if rows.len() == total {
        RowPlan::KeepAll {
            target_id: Some(target_id),
        }
    } else {
        debug!(%table, kept = rows.len(), total, "rows filtered");
        report.push(Diagnostic::RowsFiltered {
            table,
            kept: rows.len(),
            total,
        });
        RowPlan::Compact { rows, target_id }
    }
}

/// Build the output table described by `plan`, or `None` when no row survives.
pub fn materialize(
    data: &OIData,
    plan: RowPlan,
    names: OutputNames,
) -> Result<Option<OIData>, MergeError> {
    let (mut out, target_id) = match plan {
        RowPlan::DropAll => return Ok(None),
        RowPlan::KeepAll { target_id } => (data.clone(), target_id),
        RowPlan::Compact { rows, target_id } => (data.select_rows(&rows), Some(target_id)),
    };

    out.set_names(names.ins_name, names.arr_name, names.corr_name);
    if let Some(target_id) = target_id {
        out.set_target_id(target_id)?;
    }
    Ok(Some(out))
}
