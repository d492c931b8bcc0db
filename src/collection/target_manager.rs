//! # Target identity across files
//!
//! Local TARGET_ID values only mean something inside the file that defines them. The
//! [`TargetManager`] gives every distinct astronomical source seen in a collection a global
//! [`TargetKey`], so targets from different files can be compared **by identity**.
//!
//! Two target records denote the same source when:
//! 1. their normalized names are equal ([`Target::normalized_name`]), and
//! 2. their positions agree within the configured tolerance (skipped if a coordinate is NaN).
//!
//! The first record registered for a key is its **representative**: it is the record written
//! to the merged OI_TARGET table.

use smallvec::SmallVec;

use crate::{
    constants::{ArcSec, TargetId, ARCSEC_TO_DEG, DEFAULT_TARGET_TOLERANCE_ARCSEC},
    model::{OITarget, Target},
};

/// Global handle of a distinct target within one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetKey(pub(crate) usize);

impl TargetKey {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Resolve which local identifiers of a target directory denote a given target.
pub trait TargetResolver {
    /// All local TARGET_ID values of `directory` whose record denotes `key`.
    ///
    /// Each record resolves to at most one key, the one [`TargetManager::key_of`] gives it,
    /// so no local identifier is claimed by two keys.
    ///
    /// A source duplicated under several identifiers yields all of them; a source absent
    /// from the directory yields an empty set.
    fn target_ids(&self, directory: &OITarget, key: TargetKey) -> SmallVec<[TargetId; 2]>;

    /// Representative record of the target.
    fn target(&self, key: TargetKey) -> Option<&Target>;
}

#[derive(Debug, Clone)]
pub struct TargetManager {
    tolerance_arcsec: ArcSec,
    targets: Vec<Target>,
    normalized_names: Vec<String>,
}

impl Default for TargetManager {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_TOLERANCE_ARCSEC)
    }
}

impl TargetManager {
    pub fn new(tolerance_arcsec: ArcSec) -> Self {
        TargetManager {
            tolerance_arcsec,
            targets: Vec::new(),
            normalized_names: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Return the key of the registered target matching `target`, registering it first if none
    /// matches.
    pub fn register(&mut self, target: &Target) -> TargetKey {
        if let Some(key) = self.key_of(target) {
            return key;
        }
        self.normalized_names.push(target.normalized_name());
        self.targets.push(target.clone());
        TargetKey(self.targets.len() - 1)
    }

    /// Key of the registered target matching `target`, if any.
    pub fn key_of(&self, target: &Target) -> Option<TargetKey> {
        let name = target.normalized_name();
        self.targets
            .iter()
            .zip(&self.normalized_names)
            .position(|(known, known_name)| {
                *known_name == name && self.same_position(known, target)
            })
            .map(TargetKey)
    }

    fn same_position(&self, a: &Target, b: &Target) -> bool {
        match a.separation(b) {
            Some(sep) => sep <= self.tolerance_arcsec * ARCSEC_TO_DEG,
            None => true,
        }
    }
}

impl TargetResolver for TargetManager {
    fn target_ids(&self, directory: &OITarget, key: TargetKey) -> SmallVec<[TargetId; 2]> {
        directory.ids_where(|t| self.key_of(t) == Some(key))
    }

    fn target(&self, key: TargetKey) -> Option<&Target> {
        self.targets.get(key.0)
    }
}
