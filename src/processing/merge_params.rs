//! # Merge parameters
//!
//! [`MergeParams`] gathers the few knobs of a merge and [`MergeParamsBuilder`] validates them.
//!
//! ## Fields
//!
//! - `output_version`: force the OIFITS revision of the output. When unset, the highest
//!   revision among the files owning the selected data tables is used.
//! - `dedup_corr_tables`: collapse identical OI_CORR tables the same way OI_WAVELENGTH and
//!   OI_ARRAY tables are collapsed. Off by default: OI_CORR tables are always copied under
//!   the first free name.
//! - `target_tolerance_arcsec`: position tolerance used when [`crate::processing::merger::merge_files`]
//!   builds its own collection.
//!
//! The struct derives `serde` traits so it can be embedded in a caller's configuration file;
//! missing fields take their default value.
//!
//! ## Example
//!
//! ```rust
//! use oimerge::model::OIFitsStandard;
//! use oimerge::processing::merge_params::MergeParams;
//!
//! let params = MergeParams::builder()
//!     .output_version(OIFitsStandard::Version2)
//!     .dedup_corr_tables(true)
//!     .build()
//!     .unwrap();
//! assert!(params.dedup_corr_tables);
//! ```
use std::cmp::Ordering::{Equal, Greater};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    constants::{ArcSec, DEFAULT_TARGET_TOLERANCE_ARCSEC},
    model::OIFitsStandard,
    oimerge_errors::MergeError,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeParams {
    /// OIFITS revision of the output; `None` picks the highest revision of the selection.
    pub output_version: Option<OIFitsStandard>,
    /// Reuse a structurally identical OI_CORR table instead of copying it.
    pub dedup_corr_tables: bool,
    /// Position tolerance of the target matcher, in arcseconds.
    pub target_tolerance_arcsec: ArcSec,
}

impl MergeParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> MergeParamsBuilder {
        MergeParamsBuilder::new()
    }
}

impl Default for MergeParams {
    fn default() -> Self {
        MergeParams {
            output_version: None,
            dedup_corr_tables: false,
            target_tolerance_arcsec: DEFAULT_TARGET_TOLERANCE_ARCSEC,
        }
    }
}

/// Builder for [`MergeParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct MergeParamsBuilder {
    params: MergeParams,
}

impl MergeParamsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_version(mut self, v: OIFitsStandard) -> Self {
        self.params.output_version = Some(v);
        self
    }

    pub fn dedup_corr_tables(mut self, v: bool) -> Self {
        self.params.dedup_corr_tables = v;
        self
    }

    pub fn target_tolerance_arcsec(mut self, v: ArcSec) -> Self {
        self.params.target_tolerance_arcsec = v;
        self
    }

    /// Return true iff x >= 0.0, finite and comparable (i.e., not NaN).
    #[inline]
    fn finite_ge0(x: f64) -> bool {
        x.is_finite() && matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `target_tolerance_arcsec` must be finite and `>= 0.0` (zero means exact positions).
    ///
    /// Returns
    /// -----------------
    /// * `Ok(MergeParams)` if all values are valid.
    /// * `Err(MergeError::InvalidMergeParameter)` otherwise.
    pub fn build(self) -> Result<MergeParams, MergeError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

impl MergeParams {
    /// Check a parameter set obtained without the builder (e.g. deserialized).
    pub fn validate(&self) -> Result<(), MergeError> {
        if !MergeParamsBuilder::finite_ge0(self.target_tolerance_arcsec) {
            return Err(MergeError::InvalidMergeParameter(
                "target_tolerance_arcsec must be finite and >= 0".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for MergeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = self
            .output_version
            .map_or_else(|| "auto".to_string(), |v| v.to_string());

        if f.alternate() {
            const PARAM_COL: usize = 44;
            writeln!(f, "Merge Parameters")?;
            writeln!(f, "----------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            line!(
                "output_version          = {}",
                version,
                "OIFITS revision of the output"
            )?;
            line!(
                "dedup_corr_tables       = {}",
                self.dedup_corr_tables,
                "Reuse identical OI_CORR tables"
            )?;
            line!(
                "target_tolerance_arcsec = {:.3}\"",
                self.target_tolerance_arcsec,
                "Target matcher position tolerance"
            )?;
            Ok(())
        } else {
            write!(
                f,
                "MergeParams(output_version={}, dedup_corr_tables={}, target_tolerance={:.3}\")",
                version, self.dedup_corr_tables, self.target_tolerance_arcsec
            )
        }
    }
}
