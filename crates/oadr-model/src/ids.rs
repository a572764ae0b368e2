//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use crate::errors::{ModelError, ModelResult};

/// Kind marker distinguishing identifier namespaces at compile time.
pub trait IdentifierKind: 'static {
    /// Diagnostic name of the namespace.
    const NAME: &'static str;
}

/// Non-empty, case-insensitive identifier tagged with its namespace `K`.
pub struct Identifier<K> {
    text: Arc<str>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Identifier<K> {
    /// Validate and wrap `text`. Surrounding whitespace is trimmed.
    pub fn new(text: impl AsRef<str>) -> ModelResult<Self> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(ModelError::EmptyIdentifier);
        }
        Ok(Self {
            text: Arc::from(text),
            _kind: PhantomData,
        })
    }

    /// Identifier text as received.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Reinterpret this identifier in another namespace, e.g. a generic
    /// object id as the program id it is known to be.
    pub fn cast<L>(&self) -> Identifier<L> {
        Identifier {
            text: Arc::clone(&self.text),
            _kind: PhantomData,
        }
    }

    fn folded(&self) -> impl Iterator<Item = u8> + '_ {
        self.text.bytes().map(|b| b.to_ascii_lowercase())
    }
}

impl<K> Clone for Identifier<K> {
    fn clone(&self) -> Self {
        self.cast()
    }
}

impl<K> PartialEq for Identifier<K> {
    fn eq(&self, other: &Self) -> bool {
        self.text.eq_ignore_ascii_case(&other.text)
    }
}

impl<K> Eq for Identifier<K> {}

impl<K> PartialOrd for Identifier<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Identifier<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded().cmp(other.folded())
    }
}

impl<K> Hash for Identifier<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.folded() {
            state.write_u8(b);
        }
        state.write_u8(0xff);
    }
}

impl<K: IdentifierKind> fmt::Debug for Identifier<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", K::NAME, self.as_str())
    }
}

impl<K> fmt::Display for Identifier<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl<K> FromStr for Identifier<K> {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

macro_rules! identifier_kinds {
    ($($(#[$meta:meta])* $alias:ident => $kind:ident, $label:literal;)*) => {
        $(
            #[doc = concat!("Namespace marker of [`", stringify!($alias), "`].")]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum $kind {}

            impl IdentifierKind for $kind {
                const NAME: &'static str = $label;
            }

            $(#[$meta])*
            pub type $alias = Identifier<$kind>;
        )*
    };
}

identifier_kinds! {
    /// Id assigned to any top-level object by the issuing server.
    ObjectId => ObjectIdKind, "ObjectId";
    /// Id of an event.
    EventId => EventIdKind, "EventId";
    /// Id of a program.
    ProgramId => ProgramIdKind, "ProgramId";
    /// Id of a resource.
    ResourceId => ResourceIdKind, "ResourceId";
    /// Id of a subscription.
    SubscriptionId => SubscriptionIdKind, "SubscriptionId";
    /// Id of a virtual end node.
    VenId => VenIdKind, "VenId";
    /// Id of a report.
    ReportId => ReportIdKind, "ReportId";
}

/// Client-chosen interval number; not a sequence, may repeat across events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntervalId(pub i64);

impl IntervalId {
    /// Raw value.
    pub fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for IntervalId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<i32> for IntervalId {
    fn from(value: i32) -> Self {
        Self(i64::from(value))
    }
}

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
