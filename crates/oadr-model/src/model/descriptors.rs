//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Payload descriptors and report descriptors.
//!
//! Payload descriptors are a small sum type discriminated by their own
//! `objectType`. Programs carry a mix of both variants, so each element is
//! resolved through [`crate::dispatch::PAYLOAD_DESCRIPTORS`]; events and
//! reports carry one variant only and decode it directly.

use serde_json::Value as JsonValue;
use tracing::warn;

use crate::collections::UnorderedSet;
use crate::dispatch::PAYLOAD_DESCRIPTORS;
use crate::enums::{Currency, ObjectType, PayloadType, ReadingType, UnitType};
use crate::errors::{DecodeError, DecodeResult};
use crate::fields::{
    json_record, serde_via_json, DecodeOptions, Field, FieldReader, FieldWriter, FromJson,
    JsonRecord, ToJson, UnknownVariantPolicy,
};
use crate::hashing::{cached_hash, HashCode, StructuralHasher};
use crate::metrics;
use crate::model::values::ValuesMap;
use crate::numbers::{Float32, Percentage};

/// What an event payload of a given type means: its units and currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPayloadDescriptor {
    hash: HashCode,
    payload_type: PayloadType,
    units: Option<UnitType>,
    currency: Option<Currency>,
}

cached_hash!(EventPayloadDescriptor);

impl EventPayloadDescriptor {
    /// Discriminator emitted for this variant.
    pub const OBJECT_TYPE: ObjectType = ObjectType::EVENT_PAYLOAD_DESCRIPTOR;

    /// Descriptor of `payload_type`.
    pub fn new(payload_type: PayloadType, units: Option<UnitType>, currency: Option<Currency>) -> Self {
        Self {
            hash: HashCode::default(),
            payload_type,
            units,
            currency,
        }
        .sealed()
    }

    /// Described payload type.
    pub fn payload_type(&self) -> &PayloadType {
        &self.payload_type
    }

    /// Units of the payload values.
    pub fn units(&self) -> Option<&UnitType> {
        self.units.as_ref()
    }

    /// Currency of price payloads.
    pub fn currency(&self) -> Option<&Currency> {
        self.currency.as_ref()
    }

    fn sealed(mut self) -> Self {
        self.hash = StructuralHasher::new("EventPayloadDescriptor")
            .field(&self.payload_type)
            .field(&self.units)
            .field(&self.currency)
            .finish();
        self
    }
}

impl JsonRecord for EventPayloadDescriptor {
    const KIND: &'static str = "EventPayloadDescriptor";

    fn read_fields(reader: &mut FieldReader<'_>) -> Field<Self> {
        let tag = reader.expect_object_type(&Self::OBJECT_TYPE, false);
        let payload_type = reader.mandatory("payloadType");
        let units = reader.optional("units");
        let currency = reader.optional("currency");
        tag?;
        Ok(Self::new(payload_type?, units?, currency?))
    }

    fn write_fields(&self, writer: &mut FieldWriter) {
        writer
            .put("objectType", &Self::OBJECT_TYPE)
            .put("payloadType", &self.payload_type)
            .put_opt("units", self.units.as_ref())
            .put_opt("currency", self.currency.as_ref());
    }
}

/// What a report payload of a given type means and how good it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPayloadDescriptor {
    hash: HashCode,
    payload_type: PayloadType,
    reading_type: Option<ReadingType>,
    units: Option<UnitType>,
    accuracy: Option<Float32>,
    confidence: Option<Percentage>,
}

cached_hash!(ReportPayloadDescriptor);

impl ReportPayloadDescriptor {
    /// Discriminator emitted for this variant.
    pub const OBJECT_TYPE: ObjectType = ObjectType::REPORT_PAYLOAD_DESCRIPTOR;

    /// Descriptor of `payload_type` with no optional field set.
    pub fn new(payload_type: PayloadType) -> Self {
        Self::builder(payload_type).build()
    }

    /// Start building a descriptor of `payload_type`.
    pub fn builder(payload_type: PayloadType) -> ReportPayloadDescriptorBuilder {
        ReportPayloadDescriptorBuilder {
            inner: Self {
                hash: HashCode::default(),
                payload_type,
                reading_type: None,
                units: None,
                accuracy: None,
                confidence: None,
            },
        }
    }

    /// Described payload type.
    pub fn payload_type(&self) -> &PayloadType {
        &self.payload_type
    }

    /// How the values were obtained.
    pub fn reading_type(&self) -> Option<&ReadingType> {
        self.reading_type.as_ref()
    }

    /// Units of the payload values.
    pub fn units(&self) -> Option<&UnitType> {
        self.units.as_ref()
    }

    /// Accuracy of the values, in their units.
    pub fn accuracy(&self) -> Option<f32> {
        self.accuracy.map(Float32::get)
    }

    /// Confidence in the values.
    pub fn confidence(&self) -> Option<Percentage> {
        self.confidence
    }

    fn sealed(mut self) -> Self {
        self.hash = StructuralHasher::new("ReportPayloadDescriptor")
            .field(&self.payload_type)
            .field(&self.reading_type)
            .field(&self.units)
            .field(&self.accuracy)
            .field(&self.confidence)
            .finish();
        self
    }
}

/// Builder for [`ReportPayloadDescriptor`].
#[derive(Debug, Clone)]
pub struct ReportPayloadDescriptorBuilder {
    inner: ReportPayloadDescriptor,
}

impl ReportPayloadDescriptorBuilder {
    /// Set the reading type.
    pub fn reading_type(mut self, reading_type: ReadingType) -> Self {
        self.inner.reading_type = Some(reading_type);
        self
    }

    /// Set the units.
    pub fn units(mut self, units: UnitType) -> Self {
        self.inner.units = Some(units);
        self
    }

    /// Set the accuracy.
    pub fn accuracy(mut self, accuracy: Float32) -> Self {
        self.inner.accuracy = Some(accuracy);
        self
    }

    /// Set the confidence.
    pub fn confidence(mut self, confidence: Percentage) -> Self {
        self.inner.confidence = Some(confidence);
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> ReportPayloadDescriptor {
        self.inner.sealed()
    }
}

impl JsonRecord for ReportPayloadDescriptor {
    const KIND: &'static str = "ReportPayloadDescriptor";

    fn read_fields(reader: &mut FieldReader<'_>) -> Field<Self> {
        let tag = reader.expect_object_type(&Self::OBJECT_TYPE, false);
        let payload_type = reader.mandatory("payloadType");
        let reading_type = reader.optional("readingType");
        let units = reader.optional("units");
        let accuracy = reader.optional("accuracy");
        let confidence = reader.optional("confidence");
        tag?;
        Ok(Self {
            hash: HashCode::default(),
            payload_type: payload_type?,
            reading_type: reading_type?,
            units: units?,
            accuracy: accuracy?,
            confidence: confidence?,
        }
        .sealed())
    }

    fn write_fields(&self, writer: &mut FieldWriter) {
        writer
            .put("objectType", &Self::OBJECT_TYPE)
            .put("payloadType", &self.payload_type)
            .put_opt("readingType", self.reading_type.as_ref())
            .put_opt("units", self.units.as_ref())
            .put_opt("accuracy", self.accuracy.as_ref())
            .put_opt("confidence", self.confidence.as_ref());
    }
}

/// Either payload descriptor variant, as carried by programs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PayloadDescriptor {
    /// `EVENT_PAYLOAD_DESCRIPTOR`.
    Event(EventPayloadDescriptor),
    /// `REPORT_PAYLOAD_DESCRIPTOR`.
    Report(ReportPayloadDescriptor),
}

impl PayloadDescriptor {
    /// Discriminator of the carried variant.
    pub fn object_type(&self) -> ObjectType {
        match self {
            PayloadDescriptor::Event(_) => EventPayloadDescriptor::OBJECT_TYPE,
            PayloadDescriptor::Report(_) => ReportPayloadDescriptor::OBJECT_TYPE,
        }
    }

    /// Described payload type, whatever the variant.
    pub fn payload_type(&self) -> &PayloadType {
        match self {
            PayloadDescriptor::Event(d) => d.payload_type(),
            PayloadDescriptor::Report(d) => d.payload_type(),
        }
    }

    pub(crate) fn read_event(reader: &mut FieldReader<'_>) -> Field<Self> {
        EventPayloadDescriptor::read_fields(reader).map(PayloadDescriptor::Event)
    }

    pub(crate) fn read_report(reader: &mut FieldReader<'_>) -> Field<Self> {
        ReportPayloadDescriptor::read_fields(reader).map(PayloadDescriptor::Report)
    }

    /// Decode one element of a polymorphic collection. An unknown
    /// discriminator fails, or yields `None` under the skip policy.
    pub(crate) fn decode_element(json: &JsonValue, options: &DecodeOptions) -> DecodeResult<Option<Self>> {
        let mut reader = FieldReader::open("PayloadDescriptor", json, options)?;
        let tag = match reader.raw("objectType") {
            None => return Err(DecodeError::MissingField { field: "objectType" }),
            Some(raw) => raw.as_str().ok_or_else(|| {
                DecodeError::invalid_field("objectType", DecodeError::wrong_type("string", raw))
            })?,
        };
        let decode = match PAYLOAD_DESCRIPTORS.resolve(tag) {
            Ok(decode) => decode,
            Err(err) => {
                if options.unknown_descriptor == UnknownVariantPolicy::Skip {
                    warn!(object_type = tag, "skipping payload descriptor with unknown objectType");
                    metrics::record_skipped_element("payloadDescriptors");
                    return Ok(None);
                }
                return Err(err);
            }
        };
        let value = decode(&mut reader);
        reader.finish()?;
        Ok(Some(value?))
    }
}

impl FromJson for PayloadDescriptor {
    fn from_json(json: &JsonValue, options: &DecodeOptions) -> DecodeResult<Self> {
        let strict = options.with_unknown_descriptor(UnknownVariantPolicy::Reject);
        Self::decode_element(json, &strict)?.ok_or_else(|| {
            DecodeError::MalformedDocument("payload descriptor skipped under strict policy".into())
        })
    }
}

impl ToJson for PayloadDescriptor {
    fn to_json(&self) -> JsonValue {
        match self {
            PayloadDescriptor::Event(d) => d.to_json(),
            PayloadDescriptor::Report(d) => d.to_json(),
        }
    }
}

serde_via_json!(PayloadDescriptor);

impl From<EventPayloadDescriptor> for PayloadDescriptor {
    fn from(value: EventPayloadDescriptor) -> Self {
        PayloadDescriptor::Event(value)
    }
}

impl From<ReportPayloadDescriptor> for PayloadDescriptor {
    fn from(value: ReportPayloadDescriptor) -> Self {
        PayloadDescriptor::Report(value)
    }
}

/// Request for a report, embedded in an event.
///
/// The numeric fields use `-1` for "unspecified / all / indefinite" and are
/// omitted from the wire document when they hold their default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDescriptor {
    hash: HashCode,
    payload_type: PayloadType,
    reading_type: Option<ReadingType>,
    units: Option<UnitType>,
    targets: UnorderedSet<ValuesMap>,
    aggregate: bool,
    start_interval: i32,
    num_intervals: i32,
    historical: bool,
    frequency: i32,
    repeat: i32,
}

cached_hash!(ReportDescriptor);

impl ReportDescriptor {
    /// Default of `aggregate`.
    pub const DEFAULT_AGGREGATE: bool = false;
    /// Default of `startInterval`.
    pub const DEFAULT_START_INTERVAL: i32 = -1;
    /// Default of `numIntervals`.
    pub const DEFAULT_NUM_INTERVALS: i32 = -1;
    /// Default of `historical`.
    pub const DEFAULT_HISTORICAL: bool = true;
    /// Default of `frequency`.
    pub const DEFAULT_FREQUENCY: i32 = -1;
    /// Default of `repeat`.
    pub const DEFAULT_REPEAT: i32 = 1;

    /// Descriptor of `payload_type` with every default in place.
    pub fn new(payload_type: PayloadType) -> Self {
        Self::builder(payload_type).build()
    }

    /// Start building a descriptor of `payload_type`.
    pub fn builder(payload_type: PayloadType) -> ReportDescriptorBuilder {
        ReportDescriptorBuilder {
            inner: Self {
                hash: HashCode::default(),
                payload_type,
                reading_type: None,
                units: None,
                targets: UnorderedSet::new(),
                aggregate: Self::DEFAULT_AGGREGATE,
                start_interval: Self::DEFAULT_START_INTERVAL,
                num_intervals: Self::DEFAULT_NUM_INTERVALS,
                historical: Self::DEFAULT_HISTORICAL,
                frequency: Self::DEFAULT_FREQUENCY,
                repeat: Self::DEFAULT_REPEAT,
            },
        }
    }

    /// Requested payload type.
    pub fn payload_type(&self) -> &PayloadType {
        &self.payload_type
    }

    /// Requested reading type.
    pub fn reading_type(&self) -> Option<&ReadingType> {
        self.reading_type.as_ref()
    }

    /// Requested units.
    pub fn units(&self) -> Option<&UnitType> {
        self.units.as_ref()
    }

    /// Resources or devices the report should cover.
    pub fn targets(&self) -> &UnorderedSet<ValuesMap> {
        &self.targets
    }

    /// Whether values should be aggregated across targets.
    pub fn aggregate(&self) -> bool {
        self.aggregate
    }

    /// First interval to report on; `-1` means the current one.
    pub fn start_interval(&self) -> i32 {
        self.start_interval
    }

    /// Number of intervals to report on; `-1` means all.
    pub fn num_intervals(&self) -> i32 {
        self.num_intervals
    }

    /// Historical (`true`) or forecast (`false`) values.
    pub fn historical(&self) -> bool {
        self.historical
    }

    /// Intervals between reports; `-1` means once at the end.
    pub fn frequency(&self) -> i32 {
        self.frequency
    }

    /// Repetitions; `-1` means indefinitely.
    pub fn repeat(&self) -> i32 {
        self.repeat
    }

    /// Builder seeded with this descriptor's fields.
    pub fn to_builder(&self) -> ReportDescriptorBuilder {
        ReportDescriptorBuilder { inner: self.clone() }
    }

    fn sealed(mut self) -> Self {
        self.hash = StructuralHasher::new("ReportDescriptor")
            .field(&self.payload_type)
            .field(&self.reading_type)
            .field(&self.units)
            .field(&self.targets)
            .field(&self.aggregate)
            .field(&self.start_interval)
            .field(&self.num_intervals)
            .field(&self.historical)
            .field(&self.frequency)
            .field(&self.repeat)
            .finish();
        self
    }
}

/// Builder for [`ReportDescriptor`].
#[derive(Debug, Clone)]
pub struct ReportDescriptorBuilder {
    inner: ReportDescriptor,
}

impl ReportDescriptorBuilder {
    /// Set the reading type.
    pub fn reading_type(mut self, reading_type: ReadingType) -> Self {
        self.inner.reading_type = Some(reading_type);
        self
    }

    /// Set the units.
    pub fn units(mut self, units: UnitType) -> Self {
        self.inner.units = Some(units);
        self
    }

    /// Add a target; duplicates collapse.
    pub fn target(mut self, target: ValuesMap) -> Self {
        self.inner.targets.insert(target);
        self
    }

    /// Add several targets.
    pub fn targets(mut self, targets: impl IntoIterator<Item = ValuesMap>) -> Self {
        self.inner.targets.extend(targets);
        self
    }

    /// Set `aggregate`.
    pub fn aggregate(mut self, aggregate: bool) -> Self {
        self.inner.aggregate = aggregate;
        self
    }

    /// Set `startInterval`.
    pub fn start_interval(mut self, start_interval: i32) -> Self {
        self.inner.start_interval = start_interval;
        self
    }

    /// Set `numIntervals`.
    pub fn num_intervals(mut self, num_intervals: i32) -> Self {
        self.inner.num_intervals = num_intervals;
        self
    }

    /// Set `historical`.
    pub fn historical(mut self, historical: bool) -> Self {
        self.inner.historical = historical;
        self
    }

    /// Set `frequency`.
    pub fn frequency(mut self, frequency: i32) -> Self {
        self.inner.frequency = frequency;
        self
    }

    /// Set `repeat`.
    pub fn repeat(mut self, repeat: i32) -> Self {
        self.inner.repeat = repeat;
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> ReportDescriptor {
        self.inner.sealed()
    }
}

impl JsonRecord for ReportDescriptor {
    const KIND: &'static str = "ReportDescriptor";

    fn read_fields(reader: &mut FieldReader<'_>) -> Field<Self> {
        let payload_type = reader.mandatory("payloadType");
        let reading_type = reader.optional("readingType");
        let units = reader.optional("units");
        let targets = reader.set("targets");
        let aggregate = reader.optional_or("aggregate", Self::DEFAULT_AGGREGATE);
        let start_interval = reader.optional_or("startInterval", Self::DEFAULT_START_INTERVAL);
        let num_intervals = reader.optional_or("numIntervals", Self::DEFAULT_NUM_INTERVALS);
        let historical = reader.optional_or("historical", Self::DEFAULT_HISTORICAL);
        let frequency = reader.optional_or("frequency", Self::DEFAULT_FREQUENCY);
        let repeat = reader.optional_or("repeat", Self::DEFAULT_REPEAT);
        Ok(Self {
            hash: HashCode::default(),
            payload_type: payload_type?,
            reading_type: reading_type?,
            units: units?,
            targets: targets?,
            aggregate: aggregate?,
            start_interval: start_interval?,
            num_intervals: num_intervals?,
            historical: historical?,
            frequency: frequency?,
            repeat: repeat?,
        }
        .sealed())
    }

    fn write_fields(&self, writer: &mut FieldWriter) {
        writer
            .put("payloadType", &self.payload_type)
            .put_opt("readingType", self.reading_type.as_ref())
            .put_opt("units", self.units.as_ref())
            .put_nonempty("targets", &self.targets)
            .put_unless("aggregate", &self.aggregate, &Self::DEFAULT_AGGREGATE)
            .put_unless("startInterval", &self.start_interval, &Self::DEFAULT_START_INTERVAL)
            .put_unless("numIntervals", &self.num_intervals, &Self::DEFAULT_NUM_INTERVALS)
            .put_unless("historical", &self.historical, &Self::DEFAULT_HISTORICAL)
            .put_unless("frequency", &self.frequency, &Self::DEFAULT_FREQUENCY)
            .put_unless("repeat", &self.repeat, &Self::DEFAULT_REPEAT);
    }
}

json_record!(EventPayloadDescriptor, ReportPayloadDescriptor, ReportDescriptor);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::DecodeOptions;
    use crate::hashing::hash_one;
    use serde_json::json;

    #[test]
    fn default_sentinels_are_omitted() {
        let descriptor = ReportDescriptor::new(PayloadType::USAGE);
        assert_eq!(descriptor.to_json(), json!({"payloadType": "USAGE"}));
    }

    #[test]
    fn non_default_sentinels_are_emitted() {
        let descriptor = ReportDescriptor::builder(PayloadType::USAGE)
            .aggregate(true)
            .historical(false)
            .repeat(-1)
            .build();
        assert_eq!(
            descriptor.to_json(),
            json!({"payloadType": "USAGE", "aggregate": true, "historical": false, "repeat": -1})
        );
    }

    #[test]
    fn explicit_defaults_decode_equal_to_absent_ones() {
        let explicit = json!({
            "payloadType": "USAGE",
            "aggregate": false,
            "startInterval": -1,
            "numIntervals": -1,
            "historical": true,
            "frequency": -1,
            "repeat": 1
        });
        let decoded = ReportDescriptor::from_json(&explicit, &DecodeOptions::default()).unwrap();
        assert_eq!(decoded, ReportDescriptor::new(PayloadType::USAGE));
        assert_eq!(decoded.to_json(), json!({"payloadType": "USAGE"}));
    }

    #[test]
    fn report_descriptor_targets_are_a_set() {
        let a = ValuesMap::of(PayloadType::RESOURCE_NAME, ["meter-1"]);
        let b = ValuesMap::of(PayloadType::RESOURCE_NAME, ["meter-2"]);
        let one = ReportDescriptor::builder(PayloadType::USAGE)
            .targets([a.clone(), b.clone()])
            .build();
        let two = ReportDescriptor::builder(PayloadType::USAGE)
            .targets([b.clone(), a.clone(), b])
            .build();
        assert_eq!(one, two);
        assert_eq!(hash_one(&one), hash_one(&two));
        assert_eq!(two.targets().len(), 2);
    }

    #[test]
    fn event_descriptor_emits_its_discriminator() {
        let descriptor = EventPayloadDescriptor::new(PayloadType::PRICE, Some(UnitType::KWH), None);
        assert_eq!(
            descriptor.to_json(),
            json!({"objectType": "EVENT_PAYLOAD_DESCRIPTOR", "payloadType": "PRICE", "units": "KWH"})
        );
    }

    #[test]
    fn typed_descriptor_rejects_foreign_discriminator() {
        let doc = json!({"objectType": "REPORT_PAYLOAD_DESCRIPTOR", "payloadType": "PRICE"});
        let err = EventPayloadDescriptor::from_json(&doc, &DecodeOptions::default()).unwrap_err();
        assert_eq!(err, DecodeError::UnknownObjectType("REPORT_PAYLOAD_DESCRIPTOR".into()));
        let untagged = json!({"payloadType": "PRICE"});
        assert!(EventPayloadDescriptor::from_json(&untagged, &DecodeOptions::default()).is_ok());
    }

    #[test]
    fn polymorphic_descriptor_resolves_by_discriminator() {
        let doc = json!({
            "objectType": "report_payload_descriptor",
            "payloadType": "USAGE",
            "readingType": "DIRECT_READ",
            "accuracy": 0.5,
            "confidence": 90
        });
        let descriptor = PayloadDescriptor::from_json(&doc, &DecodeOptions::default()).unwrap();
        let PayloadDescriptor::Report(report) = &descriptor else {
            panic!("expected report descriptor");
        };
        assert_eq!(report.accuracy(), Some(0.5));
        assert_eq!(report.confidence().map(Percentage::get), Some(90));
        assert_eq!(descriptor.object_type(), ObjectType::REPORT_PAYLOAD_DESCRIPTOR);
    }

    #[test]
    fn built_accuracy_matches_decoded() {
        let built = ReportPayloadDescriptor::builder(PayloadType::USAGE)
            .accuracy(Float32::new(0.5).unwrap())
            .build();
        let doc = json!({"payloadType": "USAGE", "accuracy": 0.5});
        assert_eq!(built.to_json(), doc);
        assert_eq!(ReportPayloadDescriptor::from_json(&doc, &DecodeOptions::default()).unwrap(), built);
    }

    #[test]
    fn confidence_above_hundred_is_invalid() {
        let doc = json!({"payloadType": "USAGE", "confidence": 101});
        let err = ReportPayloadDescriptor::from_json(&doc, &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: "confidence", .. }));
    }

    #[test]
    fn unknown_descriptor_variant_rejects_or_skips() {
        let doc = json!({"objectType": "MYSTERY_DESCRIPTOR", "payloadType": "USAGE"});
        let strict = DecodeOptions::default();
        assert_eq!(
            PayloadDescriptor::decode_element(&doc, &strict).unwrap_err(),
            DecodeError::UnknownObjectType("MYSTERY_DESCRIPTOR".into())
        );
        let lenient = strict.with_unknown_descriptor(UnknownVariantPolicy::Skip);
        assert_eq!(PayloadDescriptor::decode_element(&doc, &lenient).unwrap(), None);
        assert!(PayloadDescriptor::from_json(&doc, &lenient).is_err());
    }
}
