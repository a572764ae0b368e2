//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Document-level entry points used by transports.
//!
//! Every decode here is counted in the `oadr_decode_*` metrics and logs the
//! failure at debug level; field-level readers stay silent.

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::errors::{DecodeError, DecodeResult};
use crate::fields::{DecodeOptions, FromJson, JsonRecord, ToJson};
use crate::metrics;
use crate::model::descriptors::{EventPayloadDescriptor, PayloadDescriptor, ReportDescriptor, ReportPayloadDescriptor};
use crate::model::entity::{ConcreteKind, Entity, ObjectKind, OpenAdrObject};
use crate::model::interval::{Interval, IntervalPeriod};
use crate::model::notification::Notification;
use crate::model::program::ProgramDescription;
use crate::model::report::ResourceReport;
use crate::model::subscription::ObjectOperation;
use crate::model::values::{Point, ValuesMap};

/// Kind label of a decodable value, used in metrics and logs.
pub trait Named {
    /// Label.
    const NAME: &'static str;
}

impl<B: ObjectKind> Named for Entity<B> {
    const NAME: &'static str = B::KIND;
}

impl Named for PayloadDescriptor {
    const NAME: &'static str = "PayloadDescriptor";
}

macro_rules! named_records {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Named for $ty {
                const NAME: &'static str = <$ty as JsonRecord>::KIND;
            }
        )*
    };
}

named_records!(
    ValuesMap,
    Point,
    Interval,
    IntervalPeriod,
    EventPayloadDescriptor,
    ReportPayloadDescriptor,
    ReportDescriptor,
    ProgramDescription,
    ResourceReport,
    ObjectOperation,
    Notification,
);

fn observed<T>(kind: &'static str, result: DecodeResult<T>) -> DecodeResult<T> {
    metrics::record_decode(kind, result.is_ok());
    if let Err(err) = &result {
        debug!(kind, error = %err, "decode failed");
    }
    result
}

fn parse_text(kind: &'static str, text: &str) -> DecodeResult<JsonValue> {
    serde_json::from_str(text).map_err(|err| {
        let err = DecodeError::from(err);
        metrics::record_decode(kind, false);
        debug!(kind, error = %err, "decode failed");
        err
    })
}

/// Decode any value that has a wire codec, e.g. a notification or a values map.
pub fn decode_value<T: FromJson + Named>(json: &JsonValue, options: &DecodeOptions) -> DecodeResult<T> {
    observed(T::NAME, T::from_json(json, options))
}

/// Decode JSON text into any value that has a wire codec.
pub fn decode_value_str<T: FromJson + Named>(text: &str, options: &DecodeOptions) -> DecodeResult<T> {
    let json = parse_text(T::NAME, text)?;
    decode_value(&json, options)
}

/// Decode any top-level object with default options.
pub fn decode(json: &JsonValue) -> DecodeResult<OpenAdrObject> {
    decode_with(json, &DecodeOptions::default())
}

/// Decode any top-level object.
pub fn decode_with(json: &JsonValue, options: &DecodeOptions) -> DecodeResult<OpenAdrObject> {
    decode_value(json, options)
}

/// Decode any top-level object from JSON text with default options.
pub fn decode_str(text: &str) -> DecodeResult<OpenAdrObject> {
    decode_value_str(text, &DecodeOptions::default())
}

/// Decode an object of kind `K`; a present `objectType` must name `K`.
pub fn decode_as<K: ConcreteKind>(json: &JsonValue, options: &DecodeOptions) -> DecodeResult<Entity<K>> {
    decode_value(json, options)
}

/// Encode a value to its wire document.
pub fn encode<T: ToJson + ?Sized>(value: &T) -> JsonValue {
    value.to_json()
}

/// Encode a value and let `hook` rewrite the document, e.g. to add vendor
/// extension fields. The hook sees the finished document and the value.
pub fn encode_with<T, F>(value: &T, hook: F) -> JsonValue
where
    T: ToJson,
    F: FnOnce(JsonValue, &T) -> JsonValue,
{
    value.to_json_with(hook)
}

/// Encode a value as JSON text.
pub fn encode_string<T: ToJson + ?Sized>(value: &T, pretty: bool) -> String {
    let json = value.to_json();
    let text = if pretty {
        serde_json::to_string_pretty(&json)
    } else {
        serde_json::to_string(&json)
    };
    // A `Value` always serialises: every map key is already a string.
    text.unwrap_or_default()
}
