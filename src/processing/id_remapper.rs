//! # Scoped identifier remapping
//!
//! Small integer identifiers (TARGET_ID) are only unique inside the file that defines them.
//! [`IdRemapper`] keeps one `old → new` table per **scope**, so `3` in one file and `3` in
//! another are never conflated.
//!
//! Identifiers that have no mapping in their scope ("extra" identifiers) resolve to the
//! configured *undefined* sentinel. The first resolution of an extra identifier memoizes the
//! sentinel in the scope and is reported as [`Resolution::Extra`]; later resolutions of the same
//! identifier return [`Resolution::Mapped`] with the sentinel, so callers warn once per
//! `(scope, id)` pair.

use std::hash::Hash;

use ahash::AHashMap;

/// Outcome of [`IdRemapper::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<I> {
    /// The identifier has a mapping (possibly the memoized sentinel).
    Mapped(I),
    /// First encounter of an unmapped identifier; the sentinel is now memoized.
    Extra,
}

#[derive(Debug, Clone)]
pub struct IdRemapper<S, I>
where
    S: Eq + Hash + Copy,
    I: Eq + Hash + Copy,
{
    undefined: I,
    scopes: AHashMap<S, AHashMap<I, I>>,
}

impl<S, I> IdRemapper<S, I>
where
    S: Eq + Hash + Copy,
    I: Eq + Hash + Copy,
{
    pub fn new(undefined: I) -> Self {
        IdRemapper {
            undefined,
            scopes: AHashMap::new(),
        }
    }

    pub fn undefined(&self) -> I {
        self.undefined
    }

    pub fn is_undefined(&self, id: I) -> bool {
        id == self.undefined
    }

    /// Make sure `scope` exists, even if no identifier is ever mapped in it.
    pub fn open_scope(&mut self, scope: S) {
        self.scopes.entry(scope).or_default();
    }

    pub fn insert(&mut self, scope: S, old: I, new: I) {
        self.scopes.entry(scope).or_default().insert(old, new);
    }

    /// Mapping of `old` in `scope`, without memoizing anything.
    pub fn get(&self, scope: S, old: I) -> Option<I> {
        self.scopes.get(&scope).and_then(|m| m.get(&old)).copied()
    }

    /// Mapping of `old` in `scope`, falling back to the sentinel.
    pub fn get_or_undefined(&self, scope: S, old: I) -> I {
        self.get(scope, old).unwrap_or(self.undefined)
    }

    /// Resolve `old` in `scope`, memoizing the sentinel for an unmapped identifier.
    pub fn resolve(&mut self, scope: S, old: I) -> Resolution<I> {
        let undefined = self.undefined;
        let mapping = self.scopes.entry(scope).or_default();
        match mapping.get(&old) {
            Some(new) => Resolution::Mapped(*new),
            None => {
                mapping.insert(old, undefined);
                Resolution::Extra
            }
        }
    }

    /// Number of identifiers mapped in `scope` (memoized extras included).
    pub fn scope_len(&self, scope: S) -> usize {
        self.scopes.get(&scope).map_or(0, |mapping| mapping.len())
    }

    pub fn nb_scopes(&self) -> usize {
        self.scopes.len()
    }
}

#[cfg(test)]
mod id_remapper_test {
    use super::*;

    #[test]
    fn test_scopes_are_independent() {
        let mut remapper: IdRemapper<usize, i16> = IdRemapper::new(i16::MIN);
        remapper.insert(0, 3, 1);
        remapper.insert(1, 3, 2);

        assert_eq!(remapper.get(0, 3), Some(1));
        assert_eq!(remapper.get(1, 3), Some(2));
        assert_eq!(remapper.get(2, 3), None);
        assert_eq!(remapper.get_or_undefined(2, 3), i16::MIN);
    }

    #[test]
    fn test_extra_ids_are_memoized_once() {
        let mut remapper: IdRemapper<usize, i16> = IdRemapper::new(i16::MIN);
        remapper.open_scope(7);
        assert_eq!(remapper.scope_len(7), 0);
        assert_eq!(remapper.nb_scopes(), 1);

        assert_eq!(remapper.resolve(7, 4), Resolution::Extra);
        assert_eq!(remapper.resolve(7, 4), Resolution::Mapped(i16::MIN));
        assert!(remapper.is_undefined(remapper.get_or_undefined(7, 4)));
        assert_eq!(remapper.scope_len(7), 1);

        // memoization does not leak into another scope
        assert_eq!(remapper.resolve(8, 4), Resolution::Extra);
    }
}
