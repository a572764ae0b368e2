//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Structural hash codes.
//!
//! Every model value computes its hash once, right after its fields are set,
//! and stores it next to them. `Hash` impls then only replay the stored code
//! and derived `PartialEq` compares it first, so unequal values usually part
//! ways on a single integer comparison.
//!
//! Ordered fields hash their elements in sequence; [`crate::UnorderedSet`]
//! fields combine element codes commutatively so every permutation of the same
//! elements produces the same code.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Hash of a single value with the fixed-key default hasher.
pub fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Cached structural hash stored inside every model value.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct HashCode(u64);

impl HashCode {
    /// Raw 64-bit code.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl Hash for HashCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0);
    }
}

impl fmt::Debug for HashCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:016x}", self.0)
    }
}

/// Field-by-field hash builder, seeded with the value kind so that two kinds
/// with identical field values still hash apart.
pub struct StructuralHasher {
    inner: DefaultHasher,
}

impl StructuralHasher {
    /// Start hashing a value of `kind`.
    pub fn new(kind: &'static str) -> Self {
        let mut inner = DefaultHasher::new();
        kind.hash(&mut inner);
        Self { inner }
    }

    /// Mix in one field.
    pub fn field<T: Hash + ?Sized>(mut self, value: &T) -> Self {
        value.hash(&mut self.inner);
        self
    }

    /// Final code.
    pub fn finish(self) -> HashCode {
        HashCode(self.inner.finish())
    }
}

/// Implement `Hash` for model types by replaying their cached `hash` field.
macro_rules! cached_hash {
    ($($ty:ty),* $(,)?) => {
        $(
            impl std::hash::Hash for $ty {
                fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                    std::hash::Hash::hash(&self.hash, state);
                }
            }
        )*
    };
}

pub(crate) use cached_hash;
