//! # oimerge
//!
//! Merge engine for optical interferometry data in the OIFITS format.
//!
//! Several OIFITS files (already parsed into the [`model`]) are combined into one new file:
//! shared lookup tables are deduplicated or renamed, local TARGET_ID values are renumbered into
//! one dense scheme, and data rows whose target or night is not selected are removed.
//!
//! ```rust
//! use oimerge::collection::OIFitsCollection;
//! use oimerge::model::{OIData, OIDataKind, OIFitsFile, OIFitsStandard, OITarget, OIWavelength, Target};
//! use oimerge::processing::{merge_params::MergeParams, merger::merge};
//!
//! let mut file = OIFitsFile::new(OIFitsStandard::Version2);
//! let mut targets = OITarget::new();
//! targets.push(4, Target::new("Altair", 297.69, 8.87));
//! file.add_table(targets)?;
//! file.add_table(OIWavelength::new("GRAV", vec![2.0e-6, 2.2e-6], vec![1e-7, 1e-7]))?;
//! file.add_table(OIData::new(OIDataKind::Vis2, "GRAV", 2, vec![4, 4], vec![58000.1, 58000.2])?)?;
//!
//! let collection = OIFitsCollection::new(vec![file]);
//! let merged = merge(&collection.select_all(), &MergeParams::default())?;
//!
//! let (_, data) = merged.oi_datas().next().unwrap();
//! assert_eq!(data.target_id(), &[1, 1]);
//! # Ok::<(), oimerge::oimerge_errors::MergeError>(())
//! ```
//!
//! ## Modules
//!
//! - [`model`]: in-memory OIFITS files and tables.
//! - [`collection`]: input files, target identity and selections.
//! - [`processing`]: the merge engine.
//! - [`oimerge_errors`]: crate-wide error type.
//! - [`constants`]: sentinels, keyword names and type aliases.

pub mod collection;
pub mod constants;
pub mod model;
pub mod oimerge_errors;
pub mod processing;

pub use collection::{OIFitsCollection, SelectorResult};
pub use model::{OIFitsFile, OIFitsStandard};
pub use oimerge_errors::MergeError;
pub use processing::{
    merge_params::MergeParams,
    merger::{merge, merge_collection, merge_files, merge_with_report},
    report::{Diagnostic, MergeReport},
};
