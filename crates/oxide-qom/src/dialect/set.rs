//! Constant sets of dialects.

use super::{Dialect, Family};

/// A set of dialects, usable in `const` items.
///
/// Emulation rules record the exact dialects lacking native support for a
/// construct as a `DialectSet` and test membership, rather than chaining
/// equality comparisons.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialectSet(u32);

impl DialectSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Creates a set from individual dialects.
    #[must_use]
    pub const fn of(dialects: &[Dialect]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < dialects.len() {
            bits |= dialects[i].bit();
            i += 1;
        }
        Self(bits)
    }

    /// Creates a set containing every dialect of the given families.
    #[must_use]
    pub const fn families(families: &[Family]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < Dialect::ALL.len() {
            let dialect = Dialect::ALL[i];
            let mut j = 0;
            while j < families.len() {
                if dialect.family() as u8 == families[j] as u8 {
                    bits |= dialect.bit();
                }
                j += 1;
            }
            i += 1;
        }
        Self(bits)
    }

    /// Returns the union of two sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns every dialect not in this set.
    #[must_use]
    pub const fn complement(self) -> Self {
        let mut all = 0;
        let mut i = 0;
        while i < Dialect::ALL.len() {
            all |= Dialect::ALL[i].bit();
            i += 1;
        }
        Self(all & !self.0)
    }

    /// Returns whether the dialect is a member of this set.
    #[must_use]
    pub const fn contains(self, dialect: Dialect) -> bool {
        self.0 & dialect.bit() != 0
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the members in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Dialect> {
        Dialect::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}
