//! # Merge processing
//!
//! The merge engine, split into its building blocks:
//!
//! - [`id_remapper`]: per-file `old → new` identifier tables with an undefined sentinel.
//! - [`target_unifier`]: output OI_TARGET table and TARGET_ID renumbering.
//! - [`lookup_dedup`]: collision-free placement of OI_WAVELENGTH, OI_ARRAY and OI_CORR tables.
//! - [`row_filter`]: row validity, compaction and lookup renaming of data tables.
//! - [`merger`]: orchestration and public entry points.
//! - [`merge_params`]: knobs of a merge.
//! - [`report`]: diagnostics of the recoverable conditions met during a merge.
//!
//! ```text
//! SelectorResult ─▶ collect tables ─▶ unify targets ─▶ place lookup tables ─▶ filter rows ─▶ OIFitsFile
//! ```

pub mod id_remapper;
pub mod lookup_dedup;
pub mod merge_params;
pub mod merger;
pub mod report;
pub mod row_filter;
pub mod target_unifier;
