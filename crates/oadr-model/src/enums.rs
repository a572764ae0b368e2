//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Open, case-insensitive string enumerations.
//!
//! The OpenADR wire format is open-world: a `payloadType` or `units` value the
//! registry has never seen is valid and gets registered on first sight. Every
//! enumeration kind owns one process-wide registry that starts out with the
//! values defined by OpenADR 3.0 and only ever grows.
//!
//! Comparison, ordering and hashing ignore ASCII case. The first spelling
//! registered for a given text becomes its canonical spelling, which is what
//! the encoder emits.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::errors::{ModelError, ModelResult};
use crate::metrics;

/// Marker implemented by each enumeration kind; ties a kind to its registry.
pub trait EnumTag: 'static {
    /// Name used in diagnostics and metric labels.
    const NAME: &'static str;

    /// Registry shared by every value of this kind.
    fn registry() -> &'static Registry;
}

#[derive(Clone)]
enum Text {
    Static(&'static str),
    Shared(Arc<str>),
}

impl Text {
    fn as_str(&self) -> &str {
        match self {
            Text::Static(s) => s,
            Text::Shared(s) => s,
        }
    }
}

/// Insert-only registry of canonical spellings, keyed by lowercased text.
pub struct Registry {
    name: &'static str,
    entries: RwLock<HashMap<String, Text>>,
}

impl Registry {
    /// Build a registry pre-populated with well-known values.
    pub fn with_well_known(name: &'static str, values: &[&'static str]) -> Self {
        let mut entries = HashMap::with_capacity(values.len());
        for value in values {
            entries
                .entry(value.to_ascii_lowercase())
                .or_insert(Text::Static(value));
        }
        Self {
            name,
            entries: RwLock::new(entries),
        }
    }

    fn lookup(&self, text: &str) -> Option<Text> {
        self.entries.read().get(&text.to_ascii_lowercase()).cloned()
    }

    fn register(&self, text: &str) -> Text {
        let key = text.to_ascii_lowercase();
        if let Some(existing) = self.entries.read().get(&key) {
            return existing.clone();
        }
        let mut entries = self.entries.write();
        // Another thread may have won the race between the two locks.
        if let Some(existing) = entries.get(&key) {
            return existing.clone();
        }
        let canonical = Text::Shared(Arc::from(text));
        entries.insert(key, canonical.clone());
        drop(entries);
        trace!(enumeration = self.name, value = text, "registered open enumeration value");
        metrics::record_enum_registration(self.name);
        canonical
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn snapshot(&self) -> Vec<Text> {
        self.entries.read().values().cloned().collect()
    }
}

/// Interned, case-insensitive enumeration value of kind `T`.
pub struct OpenEnum<T> {
    text: Text,
    _tag: PhantomData<fn() -> T>,
}

impl<T> OpenEnum<T> {
    /// Well-known value; used for the associated constants of each kind.
    pub const fn from_static(text: &'static str) -> Self {
        Self {
            text: Text::Static(text),
            _tag: PhantomData,
        }
    }

    /// Canonical spelling.
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    fn folded(&self) -> impl Iterator<Item = u8> + '_ {
        self.as_str().bytes().map(|b| b.to_ascii_lowercase())
    }
}

impl<T: EnumTag> OpenEnum<T> {
    /// Return the registered value for `text`, registering it when unseen.
    ///
    /// Surrounding whitespace is ignored; empty or whitespace-only text fails.
    pub fn register(text: &str) -> ModelResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ModelError::EmptyIdentifier);
        }
        Ok(Self {
            text: T::registry().register(text),
            _tag: PhantomData,
        })
    }

    /// Alias of [`OpenEnum::register`]: parsing an open enumeration never
    /// rejects non-empty text.
    pub fn parse(text: &str) -> ModelResult<Self> {
        Self::register(text)
    }

    /// Registered value for `text`, without registering anything.
    pub fn lookup(text: &str) -> Option<Self> {
        T::registry().lookup(text.trim()).map(|text| Self {
            text,
            _tag: PhantomData,
        })
    }

    /// Whether `text` is already known to the registry.
    pub fn is_registered(text: &str) -> bool {
        Self::lookup(text).is_some()
    }

    /// Every value registered so far, sorted case-insensitively.
    pub fn all_values() -> Vec<Self> {
        let mut values: Vec<Self> = T::registry()
            .snapshot()
            .into_iter()
            .map(|text| Self {
                text,
                _tag: PhantomData,
            })
            .collect();
        values.sort();
        values
    }

    /// Number of distinct (case-insensitive) values registered so far.
    pub fn count() -> usize {
        T::registry().len()
    }

    /// Name of the enumeration kind.
    pub fn kind() -> &'static str {
        T::NAME
    }
}

impl<T> Clone for OpenEnum<T> {
    fn clone(&self) -> Self {
        Self {
            text: self.text.clone(),
            _tag: PhantomData,
        }
    }
}

impl<T> PartialEq for OpenEnum<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_str().eq_ignore_ascii_case(other.as_str())
    }
}

impl<T> Eq for OpenEnum<T> {}

impl<T> PartialOrd for OpenEnum<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for OpenEnum<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded().cmp(other.folded())
    }
}

impl<T> Hash for OpenEnum<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.folded() {
            state.write_u8(b);
        }
        state.write_u8(0xff);
    }
}

impl<T> fmt::Debug for OpenEnum<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl<T> fmt::Display for OpenEnum<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<T> AsRef<str> for OpenEnum<T> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<T: EnumTag> FromStr for OpenEnum<T> {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::register(s)
    }
}

/// Declare an enumeration kind: its tag, registry, alias and well-known constants.
macro_rules! open_enum {
    (
        $(#[$meta:meta])*
        $alias:ident, $tag:ident, $label:literal {
            $($konst:ident => $text:literal),* $(,)?
        }
    ) => {
        #[doc = concat!("Registry tag of [`", stringify!($alias), "`].")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $tag {}

        impl EnumTag for $tag {
            const NAME: &'static str = $label;

            fn registry() -> &'static Registry {
                static REGISTRY: once_cell::sync::Lazy<Registry> = once_cell::sync::Lazy::new(|| {
                    Registry::with_well_known($label, &[$($text),*])
                });
                &REGISTRY
            }
        }

        $(#[$meta])*
        pub type $alias = OpenEnum<$tag>;

        #[allow(missing_docs)]
        impl OpenEnum<$tag> {
            $(pub const $konst: Self = Self::from_static($text);)*
        }
    };
}

open_enum! {
    /// Discriminator of top-level objects and payload descriptors.
    ObjectType, ObjectTypeTag, "ObjectType" {
        PROGRAM => "PROGRAM",
        EVENT => "EVENT",
        REPORT => "REPORT",
        SUBSCRIPTION => "SUBSCRIPTION",
        VEN => "VEN",
        RESOURCE => "RESOURCE",
        EVENT_PAYLOAD_DESCRIPTOR => "EVENT_PAYLOAD_DESCRIPTOR",
        REPORT_PAYLOAD_DESCRIPTOR => "REPORT_PAYLOAD_DESCRIPTOR",
    }
}

open_enum! {
    /// Operation named by a subscription or notification.
    Operation, OperationTag, "Operation" {
        GET => "GET",
        POST => "POST",
        PUT => "PUT",
        DELETE => "DELETE",
    }
}

open_enum! {
    /// `type` of a values map: event/report payload types, target types and
    /// attribute types share one namespace on the wire.
    PayloadType, PayloadTypeTag, "PayloadType" {
        SIMPLE => "SIMPLE",
        PRICE => "PRICE",
        CHARGE_STATE_SETPOINT => "CHARGE_STATE_SETPOINT",
        DISPATCH_SETPOINT => "DISPATCH_SETPOINT",
        DISPATCH_SETPOINT_RELATIVE => "DISPATCH_SETPOINT_RELATIVE",
        CONTROL_SETPOINT => "CONTROL_SETPOINT",
        EXPORT_PRICE => "EXPORT_PRICE",
        GHG => "GHG",
        CURVE => "CURVE",
        OLS => "OLS",
        IMPORT_CAPACITY_SUBSCRIPTION => "IMPORT_CAPACITY_SUBSCRIPTION",
        IMPORT_CAPACITY_RESERVATION => "IMPORT_CAPACITY_RESERVATION",
        IMPORT_CAPACITY_RESERVATION_FEE => "IMPORT_CAPACITY_RESERVATION_FEE",
        IMPORT_CAPACITY_AVAILABLE => "IMPORT_CAPACITY_AVAILABLE",
        IMPORT_CAPACITY_AVAILABLE_PRICE => "IMPORT_CAPACITY_AVAILABLE_PRICE",
        EXPORT_CAPACITY_SUBSCRIPTION => "EXPORT_CAPACITY_SUBSCRIPTION",
        EXPORT_CAPACITY_RESERVATION => "EXPORT_CAPACITY_RESERVATION",
        EXPORT_CAPACITY_RESERVATION_FEE => "EXPORT_CAPACITY_RESERVATION_FEE",
        EXPORT_CAPACITY_AVAILABLE => "EXPORT_CAPACITY_AVAILABLE",
        EXPORT_CAPACITY_AVAILABLE_PRICE => "EXPORT_CAPACITY_AVAILABLE_PRICE",
        IMPORT_CAPACITY_LIMIT => "IMPORT_CAPACITY_LIMIT",
        EXPORT_CAPACITY_LIMIT => "EXPORT_CAPACITY_LIMIT",
        ALERT_GRID_EMERGENCY => "ALERT_GRID_EMERGENCY",
        ALERT_BLACK_START => "ALERT_BLACK_START",
        ALERT_POSSIBLE_OUTAGE => "ALERT_POSSIBLE_OUTAGE",
        ALERT_FLEX_ALERT => "ALERT_FLEX_ALERT",
        ALERT_FIRE => "ALERT_FIRE",
        ALERT_FREEZING => "ALERT_FREEZING",
        ALERT_WIND => "ALERT_WIND",
        ALERT_TSUNAMI => "ALERT_TSUNAMI",
        ALERT_AIR_QUALITY => "ALERT_AIR_QUALITY",
        ALERT_OTHER => "ALERT_OTHER",
        CTA2045_REBOOT => "CTA2045_REBOOT",
        CTA2045_SET_OVERRIDE_STATUS => "CTA2045_SET_OVERRIDE_STATUS",
        READING => "READING",
        USAGE => "USAGE",
        DEMAND => "DEMAND",
        SETPOINT => "SETPOINT",
        DELTA_USAGE => "DELTA_USAGE",
        BASELINE => "BASELINE",
        OPERATING_STATE => "OPERATING_STATE",
        UP_REGULATION_AVAILABLE => "UP_REGULATION_AVAILABLE",
        DOWN_REGULATION_AVAILABLE => "DOWN_REGULATION_AVAILABLE",
        REGULATION_SETPOINT => "REGULATION_SETPOINT",
        STORAGE_USABLE_CAPACITY => "STORAGE_USABLE_CAPACITY",
        STORAGE_CHARGE_LEVEL => "STORAGE_CHARGE_LEVEL",
        STORAGE_MAX_DISCHARGE_POWER => "STORAGE_MAX_DISCHARGE_POWER",
        STORAGE_MAX_CHARGE_POWER => "STORAGE_MAX_CHARGE_POWER",
        SIMPLE_LEVEL => "SIMPLE_LEVEL",
        USAGE_FORECAST => "USAGE_FORECAST",
        STORAGE_DISPATCH_FORECAST => "STORAGE_DISPATCH_FORECAST",
        LOAD_SHED_DELTA_AVAILABLE => "LOAD_SHED_DELTA_AVAILABLE",
        GENERATION_DELTA_AVAILABLE => "GENERATION_DELTA_AVAILABLE",
        DATA_QUALITY => "DATA_QUALITY",
        POWER_SERVICE_LOCATION => "POWER_SERVICE_LOCATION",
        SERVICE_AREA => "SERVICE_AREA",
        GROUP => "GROUP",
        RESOURCE_NAME => "RESOURCE_NAME",
        VEN_NAME => "VEN_NAME",
        EVENT_NAME => "EVENT_NAME",
        PROGRAM_NAME => "PROGRAM_NAME",
        LOCATION => "LOCATION",
        AREA => "AREA",
        MAX_POWER_CONSUMPTION => "MAX_POWER_CONSUMPTION",
        MAX_POWER_EXPORT => "MAX_POWER_EXPORT",
        DESCRIPTION => "DESCRIPTION",
    }
}

open_enum! {
    /// Unit of measure of a payload.
    UnitType, UnitTypeTag, "UnitType" {
        KWH => "KWH",
        GHG => "GHG",
        VOLTS => "VOLTS",
        AMPS => "AMPS",
        CELSIUS => "CELSIUS",
        FAHRENHEIT => "FAHRENHEIT",
        PERCENT => "PERCENT",
        KW => "KW",
        KVAH => "KVAH",
        KVARH => "KVARH",
        KVA => "KVA",
        KVAR => "KVAR",
    }
}

open_enum! {
    /// How a reported value was obtained.
    ReadingType, ReadingTypeTag, "ReadingType" {
        DIRECT_READ => "DIRECT_READ",
        ESTIMATED => "ESTIMATED",
        SUMMED => "SUMMED",
        MEAN => "MEAN",
        PEAK => "PEAK",
        FORECAST => "FORECAST",
        AVERAGE => "AVERAGE",
    }
}

open_enum! {
    /// Retailer-defined program category.
    ProgramType, ProgramTypeTag, "ProgramType" {
        PRICING_TARIFF => "PRICING_TARIFF",
        DEMAND_RESPONSE => "DEMAND_RESPONSE",
        DYNAMIC_PRICING => "DYNAMIC_PRICING",
        CAPACITY_MANAGEMENT => "CAPACITY_MANAGEMENT",
        GHG_SIGNAL => "GHG_SIGNAL",
    }
}

open_enum! {
    /// ISO 4217 currency code, carried as an opaque validated string.
    Currency, CurrencyTag, "Currency" {
        USD => "USD",
        EUR => "EUR",
        GBP => "GBP",
        CHF => "CHF",
        CAD => "CAD",
        AUD => "AUD",
        JPY => "JPY",
        NOK => "NOK",
        SEK => "SEK",
        DKK => "DKK",
    }
}

open_enum! {
    /// ISO 3166 country code, carried as an opaque validated string.
    Country, CountryTag, "Country" {
        US => "US",
        CA => "CA",
        DE => "DE",
        FR => "FR",
        GB => "GB",
        NL => "NL",
        NO => "NO",
        SE => "SE",
        DK => "DK",
        AU => "AU",
        JP => "JP",
    }
}
