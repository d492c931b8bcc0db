//! # Observation nights
//!
//! A [`NightId`] groups data rows by observing night. Nights are counted **noon to noon UT**:
//! the identifier of a row is its MJD rounded to the nearest integer, so every observation
//! taken between 12:00 UT on day *n-1* and 12:00 UT on day *n* shares the identifier *n*.
//! This keeps a whole night at any ground-based site inside one identifier.
//!
//! [`NightIdMatcher`] answers "does this row/table belong to the selected nights?" for the
//! row filter of the merge engine.

use std::fmt;

use ahash::AHashSet;
use hifitime::Epoch;

use crate::constants::MJD;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NightId(i32);

impl NightId {
    pub fn new(value: i32) -> Self {
        NightId(value)
    }

    /// Night of an observation given its MJD (UTC).
    pub fn from_mjd(mjd: MJD) -> Self {
        NightId(mjd.round() as i32)
    }

    /// Night of an observation given its epoch.
    pub fn from_epoch(epoch: &Epoch) -> Self {
        Self::from_mjd(epoch.to_mjd_utc_days())
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for NightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Membership test over a set of selected nights.
///
/// An empty matcher carries no night constraint and accepts every night.
#[derive(Debug, Clone, Default)]
pub struct NightIdMatcher {
    nights: AHashSet<NightId>,
}

impl NightIdMatcher {
    pub fn new<'a, I>(nights: I) -> Self
    where
        I: IntoIterator<Item = &'a NightId>,
    {
        NightIdMatcher {
            nights: nights.into_iter().copied().collect(),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.nights.is_empty()
    }

    pub fn matches(&self, night: NightId) -> bool {
        self.is_unconstrained() || self.nights.contains(&night)
    }

    pub fn matches_all<I>(&self, nights: I) -> bool
    where
        I: IntoIterator<Item = NightId>,
    {
        self.is_unconstrained() || nights.into_iter().all(|n| self.nights.contains(&n))
    }
}
