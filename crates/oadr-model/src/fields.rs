//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Field-level decode/encode protocol shared by every object kind.
//!
//! A decoder is the ordered application of field extractions against one
//! [`FieldReader`]:
//!
//! * [`FieldReader::mandatory`]: absent yields `MissingField`, a bad value
//!   yields `InvalidField`.
//! * [`FieldReader::optional`]: absent yields `None`, a bad value yields
//!   `InvalidField`.
//! * [`FieldReader::list`] / [`FieldReader::set`]: absent yields an empty
//!   collection, one bad element yields `InvalidElement` for the whole field.
//!
//! Failures are recorded in the reader and surface from
//! [`FieldReader::finish`]. In fail-fast mode the first failure stops every
//! later extraction; in accumulate mode every field is attempted.
//!
//! The encoder mirror is [`FieldWriter`], which omits absent optionals, empty
//! optional collections and sentinel defaults.

use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as JsonValue};
use url::Url;

use crate::collections::UnorderedSet;
use crate::enums::{EnumTag, ObjectType, OpenEnum};
use crate::errors::{json_kind, DecodeError, DecodeResult};
use crate::ids::{Identifier, IntervalId};
use crate::numbers::{Float32, Float64, Percentage};
use crate::time::{format_timestamp, parse_timestamp, IsoDuration};

/// How many field failures one decode reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorMode {
    /// Stop at the first failing field; that failure is the result.
    #[default]
    FailFast,
    /// Attempt every field of an object and report all failures.
    Accumulate,
}

/// What to do with a polymorphic collection element whose `objectType`
/// matches no known variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownVariantPolicy {
    /// Fail the field with `InvalidElement(.., UnknownObjectType)`.
    #[default]
    Reject,
    /// Drop the element, log a warning and count it.
    Skip,
}

/// Knobs that change decode behaviour; the default is strict and fail-fast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecodeOptions {
    /// Fail-fast or accumulate.
    #[serde(default)]
    pub error_mode: ErrorMode,
    /// Policy for unknown payload descriptor variants.
    #[serde(default)]
    pub unknown_descriptor: UnknownVariantPolicy,
}

impl DecodeOptions {
    /// Strict, fail-fast options.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Same options, reporting every field failure.
    pub fn accumulating(self) -> Self {
        Self {
            error_mode: ErrorMode::Accumulate,
            ..self
        }
    }

    /// Same options with a different unknown-variant policy.
    pub fn with_unknown_descriptor(self, policy: UnknownVariantPolicy) -> Self {
        Self {
            unknown_descriptor: policy,
            ..self
        }
    }
}

/// Decode a value from its wire representation.
pub trait FromJson: Sized {
    /// Parse `json`, honouring `options` for nested objects.
    fn from_json(json: &JsonValue, options: &DecodeOptions) -> DecodeResult<Self>;
}

/// Encode a value to its wire representation.
pub trait ToJson {
    /// Build the wire document.
    fn to_json(&self) -> JsonValue;

    /// Build the wire document and let `hook` post-process it, e.g. to add
    /// vendor extension fields. The hook receives the document and the value.
    fn to_json_with<F>(&self, hook: F) -> JsonValue
    where
        F: FnOnce(JsonValue, &Self) -> JsonValue,
    {
        hook(self.to_json(), self)
    }
}

/// Object kind described as a list of named wire fields.
pub trait JsonRecord: Sized {
    /// Kind name used in diagnostics.
    const KIND: &'static str;

    /// Extract every field from `reader` and build the value.
    fn read_fields(reader: &mut FieldReader<'_>) -> Field<Self>;

    /// Emit every present field into `writer`.
    fn write_fields(&self, writer: &mut FieldWriter);
}

/// Marker returned by an extraction whose failure is already recorded in the
/// reader, or that was skipped because an earlier field failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldFailed;

/// Outcome of one field extraction.
pub type Field<T> = Result<T, FieldFailed>;

impl From<FieldFailed> for DecodeError {
    fn from(_: FieldFailed) -> Self {
        DecodeError::MalformedDocument("field extraction aborted without a recorded error".into())
    }
}

/// Cursor over one JSON object that extracts fields and records failures.
pub struct FieldReader<'a> {
    kind: &'static str,
    object: &'a Map<String, JsonValue>,
    options: &'a DecodeOptions,
    errors: Vec<DecodeError>,
}

impl<'a> FieldReader<'a> {
    /// Open `json` as an object of `kind`; anything but a JSON object is a
    /// malformed document.
    pub fn open(
        kind: &'static str,
        json: &'a JsonValue,
        options: &'a DecodeOptions,
    ) -> DecodeResult<Self> {
        let object = json.as_object().ok_or_else(|| {
            DecodeError::MalformedDocument(format!(
                "{} must be a JSON object, found {}",
                kind,
                json_kind(json)
            ))
        })?;
        Ok(Self {
            kind,
            object,
            options,
            errors: Vec::new(),
        })
    }

    /// Kind this reader decodes.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Options in effect.
    pub fn options(&self) -> &'a DecodeOptions {
        self.options
    }

    /// Raw field value; `null` counts as absent.
    pub fn raw(&self, name: &str) -> Option<&'a JsonValue> {
        self.object.get(name).filter(|v| !v.is_null())
    }

    /// Raw string value of a field, when present and a string.
    pub fn raw_str(&self, name: &str) -> Option<&'a str> {
        self.raw(name).and_then(JsonValue::as_str)
    }

    fn halted(&self) -> bool {
        self.options.error_mode == ErrorMode::FailFast && !self.errors.is_empty()
    }

    /// Record `error` against this object.
    pub fn reject<T>(&mut self, error: DecodeError) -> Field<T> {
        if !self.halted() {
            self.errors.push(error);
        }
        Err(FieldFailed)
    }

    /// Mandatory field parsed with its [`FromJson`] impl.
    pub fn mandatory<T: FromJson>(&mut self, name: &'static str) -> Field<T> {
        self.mandatory_with(name, T::from_json)
    }

    /// Mandatory field parsed with `parse`.
    pub fn mandatory_with<T>(
        &mut self,
        name: &'static str,
        parse: impl FnOnce(&JsonValue, &DecodeOptions) -> DecodeResult<T>,
    ) -> Field<T> {
        match self.optional_with(name, parse)? {
            Some(value) => Ok(value),
            None => self.reject(DecodeError::MissingField { field: name }),
        }
    }

    /// Optional field parsed with its [`FromJson`] impl.
    pub fn optional<T: FromJson>(&mut self, name: &'static str) -> Field<Option<T>> {
        self.optional_with(name, T::from_json)
    }

    /// Optional field falling back to `default` when absent.
    pub fn optional_or<T: FromJson>(&mut self, name: &'static str, default: T) -> Field<T> {
        Ok(self.optional(name)?.unwrap_or(default))
    }

    /// Optional field parsed with `parse`.
    pub fn optional_with<T>(
        &mut self,
        name: &'static str,
        parse: impl FnOnce(&JsonValue, &DecodeOptions) -> DecodeResult<T>,
    ) -> Field<Option<T>> {
        if self.halted() {
            return Err(FieldFailed);
        }
        let Some(raw) = self.raw(name) else {
            return Ok(None);
        };
        match parse(raw, self.options) {
            Ok(value) => Ok(Some(value)),
            Err(err) => self.reject(DecodeError::invalid_field(name, err)),
        }
    }

    /// Optional, order-significant collection.
    pub fn list<T: FromJson>(&mut self, name: &'static str) -> Field<Vec<T>> {
        self.elements(name, false, |json, options| T::from_json(json, options).map(Some))
    }

    /// Mandatory, order-significant collection (may be empty).
    pub fn mandatory_list<T: FromJson>(&mut self, name: &'static str) -> Field<Vec<T>> {
        self.elements(name, true, |json, options| T::from_json(json, options).map(Some))
    }

    /// Optional set-like collection; duplicates collapse.
    pub fn set<T: FromJson + Hash + Eq>(&mut self, name: &'static str) -> Field<UnorderedSet<T>> {
        Ok(self.list(name)?.into())
    }

    /// Mandatory set-like collection (may be empty); duplicates collapse.
    pub fn mandatory_set<T: FromJson + Hash + Eq>(
        &mut self,
        name: &'static str,
    ) -> Field<UnorderedSet<T>> {
        Ok(self.mandatory_list(name)?.into())
    }

    /// Collection whose elements are parsed by `parse`; an element parsed to
    /// `None` is dropped.
    pub fn elements<T>(
        &mut self,
        name: &'static str,
        required: bool,
        mut parse: impl FnMut(&JsonValue, &DecodeOptions) -> DecodeResult<Option<T>>,
    ) -> Field<Vec<T>> {
        if self.halted() {
            return Err(FieldFailed);
        }
        let Some(raw) = self.raw(name) else {
            return if required {
                self.reject(DecodeError::MissingField { field: name })
            } else {
                Ok(Vec::new())
            };
        };
        let Some(items) = raw.as_array() else {
            return self.reject(DecodeError::invalid_field(
                name,
                DecodeError::wrong_type("array", raw),
            ));
        };
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match parse(item, self.options) {
                Ok(Some(value)) => out.push(value),
                Ok(None) => {}
                Err(err) => return self.reject(DecodeError::invalid_element(name, index, err)),
            }
        }
        Ok(out)
    }

    /// Check the object's own `objectType` against `expected`. An absent
    /// discriminator is accepted unless `required`; a different one fails with
    /// `UnknownObjectType`.
    pub fn expect_object_type(&mut self, expected: &ObjectType, required: bool) -> Field<()> {
        match self.optional::<ObjectType>("objectType")? {
            Some(found) if &found == expected => Ok(()),
            Some(found) => self.reject(DecodeError::UnknownObjectType(found.to_string())),
            None if required => self.reject(DecodeError::MissingField {
                field: "objectType",
            }),
            None => Ok(()),
        }
    }

    /// Close the reader: no failure is `Ok`, one failure is that error, several
    /// (accumulate mode) are `Multiple`.
    pub fn finish(self) -> DecodeResult<()> {
        let mut errors = self.errors;
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(DecodeError::Multiple(errors)),
        }
    }

    /// Decode a whole record: open, read every field, finish.
    pub fn decode<T: JsonRecord>(json: &JsonValue, options: &DecodeOptions) -> DecodeResult<T> {
        let mut reader = FieldReader::open(T::KIND, json, options)?;
        let value = T::read_fields(&mut reader);
        reader.finish()?;
        Ok(value?)
    }
}

/// Builder of one wire object; field order follows call order.
#[derive(Debug, Default)]
pub struct FieldWriter {
    map: Map<String, JsonValue>,
}

impl FieldWriter {
    /// Empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a field unconditionally.
    pub fn put<T: ToJson + ?Sized>(&mut self, name: &str, value: &T) -> &mut Self {
        self.map.insert(name.to_owned(), value.to_json());
        self
    }

    /// Emit a field only when present.
    pub fn put_opt<T: ToJson>(&mut self, name: &str, value: Option<&T>) -> &mut Self {
        if let Some(value) = value {
            self.put(name, value);
        }
        self
    }

    /// Emit a field only when it differs from its sentinel default.
    pub fn put_unless<T: ToJson + PartialEq>(&mut self, name: &str, value: &T, default: &T) -> &mut Self {
        if value != default {
            self.put(name, value);
        }
        self
    }

    /// Emit a mandatory collection, empty or not.
    pub fn put_all<I>(&mut self, name: &str, items: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToJson,
    {
        let items: Vec<JsonValue> = items.into_iter().map(|item| item.to_json()).collect();
        self.map.insert(name.to_owned(), JsonValue::Array(items));
        self
    }

    /// Emit an optional collection only when it has elements.
    pub fn put_nonempty<I>(&mut self, name: &str, items: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToJson,
    {
        let items: Vec<JsonValue> = items.into_iter().map(|item| item.to_json()).collect();
        if !items.is_empty() {
            self.map.insert(name.to_owned(), JsonValue::Array(items));
        }
        self
    }

    /// Finished wire object.
    pub fn finish(self) -> JsonValue {
        JsonValue::Object(self.map)
    }
}

/// Implement [`FromJson`], [`ToJson`] and serde for [`JsonRecord`] types.
macro_rules! json_record {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::fields::FromJson for $ty {
                fn from_json(
                    json: &serde_json::Value,
                    options: &$crate::fields::DecodeOptions,
                ) -> $crate::errors::DecodeResult<Self> {
                    $crate::fields::FieldReader::decode::<Self>(json, options)
                }
            }

            impl $crate::fields::ToJson for $ty {
                fn to_json(&self) -> serde_json::Value {
                    let mut writer = $crate::fields::FieldWriter::new();
                    $crate::fields::JsonRecord::write_fields(self, &mut writer);
                    writer.finish()
                }
            }

            $crate::fields::serde_via_json!($ty);
        )*
    };
}

/// Route serde through the wire codecs so model values plug into
/// `serde_json::to_string` / `from_str` and any serde-based transport.
macro_rules! serde_via_json {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serde::Serialize::serialize(&$crate::fields::ToJson::to_json(self), serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let json = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
                <Self as $crate::fields::FromJson>::from_json(
                    &json,
                    &$crate::fields::DecodeOptions::default(),
                )
                .map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use json_record;
pub(crate) use serde_via_json;

// ── Scalars ─────────────────────────────────────────────────────────

fn expect_str<'j>(json: &'j JsonValue) -> DecodeResult<&'j str> {
    json.as_str()
        .ok_or_else(|| DecodeError::wrong_type("string", json))
}

fn expect_i64(json: &JsonValue) -> DecodeResult<i64> {
    json.as_i64()
        .ok_or_else(|| DecodeError::wrong_type("integer", json))
}

fn expect_f64(json: &JsonValue) -> DecodeResult<f64> {
    json.as_f64()
        .ok_or_else(|| DecodeError::wrong_type("number", json))
}

// `Float32` and `Float64` only hold finite values, so the `Null` arm is dead.
fn number(value: f64) -> JsonValue {
    debug_assert!(value.is_finite(), "non-finite number reached the encoder");
    Number::from_f64(value).map_or(JsonValue::Null, JsonValue::Number)
}

impl FromJson for String {
    fn from_json(json: &JsonValue, _: &DecodeOptions) -> DecodeResult<Self> {
        expect_str(json).map(str::to_owned)
    }
}

impl ToJson for String {
    fn to_json(&self) -> JsonValue {
        JsonValue::String(self.clone())
    }
}

impl ToJson for str {
    fn to_json(&self) -> JsonValue {
        JsonValue::String(self.to_owned())
    }
}

impl FromJson for bool {
    fn from_json(json: &JsonValue, _: &DecodeOptions) -> DecodeResult<Self> {
        json.as_bool()
            .ok_or_else(|| DecodeError::wrong_type("boolean", json))
    }
}

impl ToJson for bool {
    fn to_json(&self) -> JsonValue {
        JsonValue::Bool(*self)
    }
}

impl FromJson for i64 {
    fn from_json(json: &JsonValue, _: &DecodeOptions) -> DecodeResult<Self> {
        expect_i64(json)
    }
}

impl ToJson for i64 {
    fn to_json(&self) -> JsonValue {
        JsonValue::from(*self)
    }
}

impl FromJson for i32 {
    fn from_json(json: &JsonValue, _: &DecodeOptions) -> DecodeResult<Self> {
        let value = expect_i64(json)?;
        i32::try_from(value)
            .map_err(|_| DecodeError::InvalidValue(format!("{value} does not fit a 32-bit integer")))
    }
}

impl ToJson for i32 {
    fn to_json(&self) -> JsonValue {
        JsonValue::from(*self)
    }
}

impl FromJson for u32 {
    fn from_json(json: &JsonValue, _: &DecodeOptions) -> DecodeResult<Self> {
        let value = expect_i64(json)?;
        u32::try_from(value).map_err(|_| {
            DecodeError::InvalidValue(format!("{value} is not an unsigned 32-bit integer"))
        })
    }
}

impl ToJson for u32 {
    fn to_json(&self) -> JsonValue {
        JsonValue::from(*self)
    }
}

impl FromJson for Float32 {
    fn from_json(json: &JsonValue, _: &DecodeOptions) -> DecodeResult<Self> {
        Ok(Float32::narrow(expect_f64(json)?)?)
    }
}

impl ToJson for Float32 {
    fn to_json(&self) -> JsonValue {
        number(self.to_wire())
    }
}

impl FromJson for Float64 {
    fn from_json(json: &JsonValue, _: &DecodeOptions) -> DecodeResult<Self> {
        Ok(Float64::new(expect_f64(json)?)?)
    }
}

impl ToJson for Float64 {
    fn to_json(&self) -> JsonValue {
        number(self.get())
    }
}

impl FromJson for Percentage {
    fn from_json(json: &JsonValue, _: &DecodeOptions) -> DecodeResult<Self> {
        Ok(Percentage::new(expect_i64(json)?)?)
    }
}

impl ToJson for Percentage {
    fn to_json(&self) -> JsonValue {
        JsonValue::from(self.get())
    }
}

impl FromJson for DateTime<Utc> {
    fn from_json(json: &JsonValue, _: &DecodeOptions) -> DecodeResult<Self> {
        Ok(parse_timestamp(expect_str(json)?)?)
    }
}

impl ToJson for DateTime<Utc> {
    fn to_json(&self) -> JsonValue {
        JsonValue::String(format_timestamp(self))
    }
}

impl FromJson for IsoDuration {
    fn from_json(json: &JsonValue, _: &DecodeOptions) -> DecodeResult<Self> {
        Ok(IsoDuration::parse(expect_str(json)?)?)
    }
}

impl ToJson for IsoDuration {
    fn to_json(&self) -> JsonValue {
        JsonValue::String(self.to_string())
    }
}

impl FromJson for Url {
    fn from_json(json: &JsonValue, _: &DecodeOptions) -> DecodeResult<Self> {
        let text = expect_str(json)?;
        Url::parse(text).map_err(|err| DecodeError::InvalidValue(format!("url {text:?}: {err}")))
    }
}

impl ToJson for Url {
    fn to_json(&self) -> JsonValue {
        JsonValue::String(self.as_str().to_owned())
    }
}

impl<T: EnumTag> FromJson for OpenEnum<T> {
    fn from_json(json: &JsonValue, _: &DecodeOptions) -> DecodeResult<Self> {
        Ok(OpenEnum::register(expect_str(json)?)?)
    }
}

impl<T> ToJson for OpenEnum<T> {
    fn to_json(&self) -> JsonValue {
        JsonValue::String(self.as_str().to_owned())
    }
}

impl<K> FromJson for Identifier<K> {
    fn from_json(json: &JsonValue, _: &DecodeOptions) -> DecodeResult<Self> {
        Ok(Identifier::new(expect_str(json)?)?)
    }
}

impl<K> ToJson for Identifier<K> {
    fn to_json(&self) -> JsonValue {
        JsonValue::String(self.as_str().to_owned())
    }
}

impl FromJson for IntervalId {
    fn from_json(json: &JsonValue, _: &DecodeOptions) -> DecodeResult<Self> {
        expect_i64(json).map(IntervalId)
    }
}

impl ToJson for IntervalId {
    fn to_json(&self) -> JsonValue {
        JsonValue::from(self.value())
    }
}

impl<T: ToJson + ?Sized> ToJson for &T {
    fn to_json(&self) -> JsonValue {
        (**self).to_json()
    }
}

impl<T: ToJson> ToJson for Vec<T> {
    fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.iter().map(ToJson::to_json).collect())
    }
}

impl<T: ToJson + Hash + Eq> ToJson for UnorderedSet<T> {
    fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.iter().map(ToJson::to_json).collect())
    }
}
