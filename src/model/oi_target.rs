use smallvec::SmallVec;

use crate::constants::{Degree, TargetId, RADEG};

use super::Keywords;

/// Identity record of an astronomical source, as stored in one OI_TARGET row.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub target: String,
    pub raep0: Degree,
    pub decep0: Degree,
    pub equinox: f32,
    pub ra_err: Degree,
    pub dec_err: Degree,
    pub sysvel: f64,
    pub veltyp: String,
    pub veldef: String,
    pub pmra: f64,
    pub pmdec: f64,
    pub pmra_err: f64,
    pub pmdec_err: f64,
    pub parallax: f32,
    pub para_err: f32,
    pub spectyp: String,
    /// CATEGORY column (OIFITS v2 only)
    pub category: Option<String>,
}

impl Target {
    /// Create a target with the given name and J2000 position, other fields left blank.
    pub fn new(name: impl Into<String>, raep0: Degree, decep0: Degree) -> Self {
        Target {
            target: name.into(),
            raep0,
            decep0,
            equinox: 2000.0,
            ra_err: 0.0,
            dec_err: 0.0,
            sysvel: 0.0,
            veltyp: "UNKNOWN".into(),
            veldef: "OPTICAL".into(),
            pmra: 0.0,
            pmdec: 0.0,
            pmra_err: 0.0,
            pmdec_err: 0.0,
            parallax: 0.0,
            para_err: 0.0,
            spectyp: String::new(),
            category: None,
        }
    }

    /// Target name folded to upper case with blanks, `_` and `-` removed.
    ///
    /// Observers spell the same source differently ("HD 1234", "hd_1234", "HD-1234"); the
    /// normalized form is what the target matcher compares.
    pub fn normalized_name(&self) -> String {
        self.target
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_uppercase)
            .collect()
    }

    /// Angular separation with another target, in degrees (haversine formula).
    ///
    /// Return
    /// ----------
    /// * `None` if any coordinate is NaN.
    pub fn separation(&self, other: &Target) -> Option<Degree> {
        if [self.raep0, self.decep0, other.raep0, other.decep0]
            .iter()
            .any(|v| v.is_nan())
        {
            return None;
        }
        let (ra1, dec1) = (self.raep0 * RADEG, self.decep0 * RADEG);
        let (ra2, dec2) = (other.raep0 * RADEG, other.decep0 * RADEG);

        let sin_ddec = ((dec2 - dec1) / 2.0).sin();
        let sin_dra = ((ra2 - ra1) / 2.0).sin();
        let h = sin_ddec * sin_ddec + dec1.cos() * dec2.cos() * sin_dra * sin_dra;

        Some(2.0 * h.sqrt().min(1.0).asin() / RADEG)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetEntry {
    pub target_id: TargetId,
    pub target: Target,
}

/// OI_TARGET table: the per-file directory mapping local TARGET_ID values to targets.
///
/// A single source may legitimately appear under several local identifiers (files produced
/// by merging tools or by instrument pipelines often duplicate rows).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OITarget {
    entries: Vec<TargetEntry>,
    pub keywords: Keywords,
}

impl OITarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        OITarget {
            entries: Vec::with_capacity(capacity),
            keywords: Keywords::new(),
        }
    }

    pub fn push(&mut self, target_id: TargetId, target: Target) {
        self.entries.push(TargetEntry { target_id, target });
    }

    pub fn entries(&self) -> &[TargetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn target_ids(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.entries.iter().map(|e| e.target_id)
    }

    /// First target registered under the given local identifier.
    pub fn target(&self, target_id: TargetId) -> Option<&Target> {
        self.entries
            .iter()
            .find(|e| e.target_id == target_id)
            .map(|e| &e.target)
    }

    /// All local identifiers whose target satisfies the predicate, in table order.
    pub fn ids_where<P>(&self, mut predicate: P) -> SmallVec<[TargetId; 2]>
    where
        P: FnMut(&Target) -> bool,
    {
        self.entries
            .iter()
            .filter(|e| predicate(&e.target))
            .map(|e| e.target_id)
            .collect()
    }
}
