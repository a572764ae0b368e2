//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexSet;

use crate::hashing::hash_one;

const SET_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Collection field that is a sequence on the wire but a set in the model.
///
/// Duplicates are dropped on construction (first occurrence wins), iteration
/// follows first-seen order so re-encoding is stable, and equality plus
/// hashing ignore order entirely.
#[derive(Clone)]
pub struct UnorderedSet<T: Hash + Eq> {
    items: IndexSet<T>,
}

impl<T: Hash + Eq> UnorderedSet<T> {
    /// Empty set.
    pub fn new() -> Self {
        Self {
            items: IndexSet::new(),
        }
    }

    /// Insert `item`; returns `false` when an equal element was already present.
    pub fn insert(&mut self, item: T) -> bool {
        self.items.insert(item)
    }

    /// Number of distinct elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set has no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Membership test.
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    /// Elements in first-seen order.
    pub fn iter(&self) -> indexmap::set::Iter<'_, T> {
        self.items.iter()
    }

    /// First element matching `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<&T> {
        self.items.iter().find(|item| predicate(item))
    }
}

impl<T: Hash + Eq> Default for UnorderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq> PartialEq for UnorderedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len() && self.items.iter().all(|i| other.items.contains(i))
    }
}

impl<T: Hash + Eq> Eq for UnorderedSet<T> {}

impl<T: Hash + Eq> Hash for UnorderedSet<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let combined = self
            .items
            .iter()
            .map(|item| spread(hash_one(item)))
            .fold(SET_SALT, u64::wrapping_add);
        state.write_usize(self.items.len());
        state.write_u64(combined);
    }
}

/// Avalanche step so that commutative addition of element codes does not let
/// structured inputs cancel out.
fn spread(mut x: u64) -> u64 {
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    x ^ (x >> 33)
}

impl<T: Hash + Eq + fmt::Debug> fmt::Debug for UnorderedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.items.iter()).finish()
    }
}

impl<T: Hash + Eq> FromIterator<T> for UnorderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T: Hash + Eq> Extend<T> for UnorderedSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<T: Hash + Eq> From<Vec<T>> for UnorderedSet<T> {
    fn from(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}

impl<T: Hash + Eq, const N: usize> From<[T; N]> for UnorderedSet<T> {
    fn from(items: [T; N]) -> Self {
        items.into_iter().collect()
    }
}

impl<T: Hash + Eq> IntoIterator for UnorderedSet<T> {
    type Item = T;
    type IntoIter = indexmap::set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T: Hash + Eq> IntoIterator for &'a UnorderedSet<T> {
    type Item = &'a T;
    type IntoIter = indexmap::set::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutations_are_equal_and_hash_alike() {
        let a: UnorderedSet<_> = ["a", "b", "c"].into();
        let b: UnorderedSet<_> = ["c", "a", "b"].into();
        assert_eq!(a, b);
        assert_eq!(hash_one(&a), hash_one(&b));
    }

    #[test]
    fn duplicates_collapse_on_construction() {
        let with_dupes: UnorderedSet<_> = [1, 2, 2, 1, 3].into();
        let plain: UnorderedSet<_> = [3, 2, 1].into();
        assert_eq!(with_dupes.len(), 3);
        assert_eq!(with_dupes, plain);
        assert_eq!(with_dupes.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn different_members_differ() {
        let a: UnorderedSet<_> = [1, 2].into();
        let b: UnorderedSet<_> = [1, 3].into();
        let c: UnorderedSet<_> = [1].into();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(hash_one(&a), hash_one(&b));
    }

    #[test]
    fn empty_sets_are_equal() {
        assert_eq!(UnorderedSet::<u8>::new(), UnorderedSet::default());
    }
}
