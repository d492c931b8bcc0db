//! # Strict structural comparison of lookup tables
//!
//! Two lookup tables are **strictly equal** when every header keyword and every column value
//! is identical. Floating-point values are compared bit for bit, so `NaN` equals `NaN` and
//! `0.0` differs from `-0.0`: the comparison answers "would these tables serialize to the same
//! bytes", not "are these numbers close".
//!
//! The table's own name keyword (INSNAME, ARRNAME, CORRNAME) is **not** compared. The merge
//! engine probes an output table under a suffixed candidate name (`LOW_1`, `LOW_2`, …) and must
//! still recognize an incoming `LOW` table with the same content as a duplicate.

use nalgebra::Vector3;

use super::{oi_array::Station, KeywordValue, Keywords, OIArray, OICorr, OIWavelength};

/// Keyword-for-keyword, column-for-column equality.
pub trait StrictEq {
    fn strict_eq(&self, other: &Self) -> bool;
}

/// Compare two tables of the same kind with the strict comparator.
pub fn compare_table<T: StrictEq>(a: &T, b: &T) -> bool {
    a.strict_eq(b)
}

fn same_f64(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits()
}

fn same_f32(a: f32, b: f32) -> bool {
    a.to_bits() == b.to_bits()
}

fn same_f64s(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_f64(*x, *y))
}

fn same_f32s(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_f32(*x, *y))
}

fn same_xyz(a: &Vector3<f64>, b: &Vector3<f64>) -> bool {
    same_f64s(a.as_slice(), b.as_slice())
}

fn same_keywords(a: &Keywords, b: &Keywords) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|((ka, va), (kb, vb))| {
            ka == kb
                && match (va, vb) {
                    (KeywordValue::Real(x), KeywordValue::Real(y)) => same_f64(*x, *y),
                    _ => va == vb,
                }
        })
}

impl StrictEq for OIWavelength {
    fn strict_eq(&self, other: &Self) -> bool {
        same_keywords(&self.keywords, &other.keywords)
            && same_f32s(&self.eff_wave, &other.eff_wave)
            && same_f32s(&self.eff_band, &other.eff_band)
    }
}

impl StrictEq for Station {
    fn strict_eq(&self, other: &Self) -> bool {
        self.tel_name == other.tel_name
            && self.sta_name == other.sta_name
            && self.sta_index == other.sta_index
            && same_f32(self.diameter, other.diameter)
            && same_xyz(&self.sta_xyz, &other.sta_xyz)
    }
}

impl StrictEq for OIArray {
    fn strict_eq(&self, other: &Self) -> bool {
        self.frame == other.frame
            && same_xyz(&self.array_xyz, &other.array_xyz)
            && same_keywords(&self.keywords, &other.keywords)
            && self.stations.len() == other.stations.len()
            && self
                .stations
                .iter()
                .zip(&other.stations)
                .all(|(a, b)| a.strict_eq(b))
    }
}

impl StrictEq for OICorr {
    fn strict_eq(&self, other: &Self) -> bool {
        self.ndata == other.ndata
            && same_keywords(&self.keywords, &other.keywords)
            && self.iindx == other.iindx
            && self.jindx == other.jindx
            && same_f64s(&self.corr, &other.corr)
    }
}
