//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use url::Url;

use crate::collections::UnorderedSet;
use crate::enums::{Country, ProgramType};
use crate::fields::{json_record, Field, FieldReader, FieldWriter, JsonRecord};
use crate::hashing::{cached_hash, HashCode, StructuralHasher};
use crate::model::descriptors::PayloadDescriptor;
use crate::model::interval::IntervalPeriod;
use crate::model::values::ValuesMap;
use crate::time::IsoDuration;

/// Link to a human-readable program description, `{"URL": "..."}` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramDescription {
    url: Url,
}

impl ProgramDescription {
    /// Description located at `url`.
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// Location of the description.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl From<Url> for ProgramDescription {
    fn from(url: Url) -> Self {
        Self::new(url)
    }
}

impl JsonRecord for ProgramDescription {
    const KIND: &'static str = "ProgramDescription";

    fn read_fields(reader: &mut FieldReader<'_>) -> Field<Self> {
        reader.mandatory("URL").map(Self::new)
    }

    fn write_fields(&self, writer: &mut FieldWriter) {
        writer.put("URL", &self.url);
    }
}

json_record!(ProgramDescription);

/// Demand response program: the umbrella under which events are issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    hash: HashCode,
    program_name: String,
    program_long_name: Option<String>,
    retailer_name: Option<String>,
    retailer_long_name: Option<String>,
    program_type: Option<ProgramType>,
    country: Option<Country>,
    principal_subdivision: Option<String>,
    time_zone_offset: Option<IsoDuration>,
    interval_period: Option<IntervalPeriod>,
    program_descriptions: UnorderedSet<ProgramDescription>,
    binding_events: Option<bool>,
    local_price: Option<bool>,
    payload_descriptors: UnorderedSet<PayloadDescriptor>,
    targets: UnorderedSet<ValuesMap>,
}

cached_hash!(Program);

impl Program {
    /// Start building a program called `program_name`.
    pub fn builder(program_name: impl Into<String>) -> ProgramBuilder {
        ProgramBuilder {
            inner: Self {
                hash: HashCode::default(),
                program_name: program_name.into(),
                program_long_name: None,
                retailer_name: None,
                retailer_long_name: None,
                program_type: None,
                country: None,
                principal_subdivision: None,
                time_zone_offset: None,
                interval_period: None,
                program_descriptions: UnorderedSet::new(),
                binding_events: None,
                local_price: None,
                payload_descriptors: UnorderedSet::new(),
                targets: UnorderedSet::new(),
            },
        }
    }

    /// Builder seeded with this program's fields.
    pub fn to_builder(&self) -> ProgramBuilder {
        ProgramBuilder { inner: self.clone() }
    }

    /// Short name, unique per VTN.
    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    /// Long name.
    pub fn program_long_name(&self) -> Option<&str> {
        self.program_long_name.as_deref()
    }

    /// Short retailer name.
    pub fn retailer_name(&self) -> Option<&str> {
        self.retailer_name.as_deref()
    }

    /// Long retailer name.
    pub fn retailer_long_name(&self) -> Option<&str> {
        self.retailer_long_name.as_deref()
    }

    /// Program category.
    pub fn program_type(&self) -> Option<&ProgramType> {
        self.program_type.as_ref()
    }

    /// Country the program runs in.
    pub fn country(&self) -> Option<&Country> {
        self.country.as_ref()
    }

    /// State or province.
    pub fn principal_subdivision(&self) -> Option<&str> {
        self.principal_subdivision.as_deref()
    }

    /// Offset of local time from UTC.
    pub fn time_zone_offset(&self) -> Option<&IsoDuration> {
        self.time_zone_offset.as_ref()
    }

    /// Period the program is active.
    pub fn interval_period(&self) -> Option<&IntervalPeriod> {
        self.interval_period.as_ref()
    }

    /// Human-readable descriptions.
    pub fn program_descriptions(&self) -> &UnorderedSet<ProgramDescription> {
        &self.program_descriptions
    }

    /// Whether events of this program are binding.
    pub fn binding_events(&self) -> Option<bool> {
        self.binding_events
    }

    /// Whether prices are local.
    pub fn local_price(&self) -> Option<bool> {
        self.local_price
    }

    /// Descriptors of the payloads the program's events and reports carry.
    pub fn payload_descriptors(&self) -> &UnorderedSet<PayloadDescriptor> {
        &self.payload_descriptors
    }

    /// Who the program applies to.
    pub fn targets(&self) -> &UnorderedSet<ValuesMap> {
        &self.targets
    }

    fn sealed(mut self) -> Self {
        self.hash = StructuralHasher::new("Program")
            .field(&self.program_name)
            .field(&self.program_long_name)
            .field(&self.retailer_name)
            .field(&self.retailer_long_name)
            .field(&self.program_type)
            .field(&self.country)
            .field(&self.principal_subdivision)
            .field(&self.time_zone_offset)
            .field(&self.interval_period)
            .field(&self.program_descriptions)
            .field(&self.binding_events)
            .field(&self.local_price)
            .field(&self.payload_descriptors)
            .field(&self.targets)
            .finish();
        self
    }
}

/// Builder for [`Program`].
#[derive(Debug, Clone)]
pub struct ProgramBuilder {
    inner: Program,
}

impl ProgramBuilder {
    /// Set the long name.
    pub fn program_long_name(mut self, value: impl Into<String>) -> Self {
        self.inner.program_long_name = Some(value.into());
        self
    }

    /// Set the short retailer name.
    pub fn retailer_name(mut self, value: impl Into<String>) -> Self {
        self.inner.retailer_name = Some(value.into());
        self
    }

    /// Set the long retailer name.
    pub fn retailer_long_name(mut self, value: impl Into<String>) -> Self {
        self.inner.retailer_long_name = Some(value.into());
        self
    }

    /// Set the program category.
    pub fn program_type(mut self, value: ProgramType) -> Self {
        self.inner.program_type = Some(value);
        self
    }

    /// Set the country.
    pub fn country(mut self, value: Country) -> Self {
        self.inner.country = Some(value);
        self
    }

    /// Set the state or province.
    pub fn principal_subdivision(mut self, value: impl Into<String>) -> Self {
        self.inner.principal_subdivision = Some(value.into());
        self
    }

    /// Set the UTC offset.
    pub fn time_zone_offset(mut self, value: IsoDuration) -> Self {
        self.inner.time_zone_offset = Some(value);
        self
    }

    /// Set the active period.
    pub fn interval_period(mut self, value: IntervalPeriod) -> Self {
        self.inner.interval_period = Some(value);
        self
    }

    /// Add a description link.
    pub fn program_description(mut self, url: Url) -> Self {
        self.inner.program_descriptions.insert(ProgramDescription::new(url));
        self
    }

    /// Set whether events are binding.
    pub fn binding_events(mut self, value: bool) -> Self {
        self.inner.binding_events = Some(value);
        self
    }

    /// Set whether prices are local.
    pub fn local_price(mut self, value: bool) -> Self {
        self.inner.local_price = Some(value);
        self
    }

    /// Add a payload descriptor of either variant.
    pub fn payload_descriptor(mut self, value: impl Into<PayloadDescriptor>) -> Self {
        self.inner.payload_descriptors.insert(value.into());
        self
    }

    /// Add a target.
    pub fn target(mut self, value: ValuesMap) -> Self {
        self.inner.targets.insert(value);
        self
    }

    /// Add several targets.
    pub fn targets(mut self, values: impl IntoIterator<Item = ValuesMap>) -> Self {
        self.inner.targets.extend(values);
        self
    }

    /// Finish the program.
    pub fn build(self) -> Program {
        self.inner.sealed()
    }
}

impl JsonRecord for Program {
    const KIND: &'static str = "Program";

    fn read_fields(reader: &mut FieldReader<'_>) -> Field<Self> {
        let program_name = reader.mandatory("programName");
        let program_long_name = reader.optional("programLongName");
        let retailer_name = reader.optional("retailerName");
        let retailer_long_name = reader.optional("retailerLongName");
        let program_type = reader.optional("programType");
        let country = reader.optional("country");
        let principal_subdivision = reader.optional("principalSubdivision");
        let time_zone_offset = reader.optional("timeZoneOffset");
        let interval_period = reader.optional("intervalPeriod");
        let program_descriptions = reader.set("programDescriptions");
        let binding_events = reader.optional("bindingEvents");
        let local_price = reader.optional("localPrice");
        let payload_descriptors = reader
            .elements("payloadDescriptors", false, PayloadDescriptor::decode_element)
            .map(UnorderedSet::from);
        let targets = reader.set("targets");
        Ok(Self {
            hash: HashCode::default(),
            program_name: program_name?,
            program_long_name: program_long_name?,
            retailer_name: retailer_name?,
            retailer_long_name: retailer_long_name?,
            program_type: program_type?,
            country: country?,
            principal_subdivision: principal_subdivision?,
            time_zone_offset: time_zone_offset?,
            interval_period: interval_period?,
            program_descriptions: program_descriptions?,
            binding_events: binding_events?,
            local_price: local_price?,
            payload_descriptors: payload_descriptors?,
            targets: targets?,
        }
        .sealed())
    }

    fn write_fields(&self, writer: &mut FieldWriter) {
        writer
            .put("programName", &self.program_name)
            .put_opt("programLongName", self.program_long_name.as_ref())
            .put_opt("retailerName", self.retailer_name.as_ref())
            .put_opt("retailerLongName", self.retailer_long_name.as_ref())
            .put_opt("programType", self.program_type.as_ref())
            .put_opt("country", self.country.as_ref())
            .put_opt("principalSubdivision", self.principal_subdivision.as_ref())
            .put_opt("timeZoneOffset", self.time_zone_offset.as_ref())
            .put_opt("intervalPeriod", self.interval_period.as_ref())
            .put_nonempty("programDescriptions", &self.program_descriptions)
            .put_opt("bindingEvents", self.binding_events.as_ref())
            .put_opt("localPrice", self.local_price.as_ref())
            .put_nonempty("payloadDescriptors", &self.payload_descriptors)
            .put_nonempty("targets", &self.targets);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{Currency, PayloadType, UnitType};
    use crate::errors::DecodeError;
    use crate::fields::{DecodeOptions, UnknownVariantPolicy};
    use crate::hashing::hash_one;
    use crate::model::descriptors::{EventPayloadDescriptor, ReportPayloadDescriptor};
    use serde_json::json;

    fn read(doc: &serde_json::Value, options: &DecodeOptions) -> crate::errors::DecodeResult<Program> {
        FieldReader::decode::<Program>(doc, options)
    }

    #[test]
    fn program_name_is_mandatory() {
        let err = read(&json!({"programLongName": "x"}), &DecodeOptions::default()).unwrap_err();
        assert_eq!(err, DecodeError::MissingField { field: "programName" });
    }

    #[test]
    fn payload_descriptors_mix_both_variants() {
        let doc = json!({
            "programName": "p",
            "payloadDescriptors": [
                {"objectType": "EVENT_PAYLOAD_DESCRIPTOR", "payloadType": "PRICE", "currency": "USD"},
                {"objectType": "REPORT_PAYLOAD_DESCRIPTOR", "payloadType": "USAGE", "units": "KWH"}
            ]
        });
        let program = read(&doc, &DecodeOptions::default()).unwrap();
        let expected = Program::builder("p")
            .payload_descriptor(EventPayloadDescriptor::new(
                PayloadType::PRICE,
                None,
                Some(Currency::USD),
            ))
            .payload_descriptor(
                ReportPayloadDescriptor::builder(PayloadType::USAGE)
                    .units(UnitType::KWH)
                    .build(),
            )
            .build();
        assert_eq!(program, expected);
        let mut writer = FieldWriter::new();
        program.write_fields(&mut writer);
        assert_eq!(writer.finish(), doc);
    }

    #[test]
    fn unknown_descriptor_fails_the_field_by_default() {
        let doc = json!({
            "programName": "p",
            "payloadDescriptors": [
                {"objectType": "EVENT_PAYLOAD_DESCRIPTOR", "payloadType": "PRICE"},
                {"objectType": "SOMETHING_ELSE", "payloadType": "PRICE"}
            ]
        });
        let err = read(&doc, &DecodeOptions::default()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::invalid_element(
                "payloadDescriptors",
                1,
                DecodeError::UnknownObjectType("SOMETHING_ELSE".into())
            )
        );

        let options = DecodeOptions::default().with_unknown_descriptor(UnknownVariantPolicy::Skip);
        let program = read(&doc, &options).unwrap();
        assert_eq!(program.payload_descriptors().len(), 1);
    }

    #[test]
    fn set_fields_ignore_order_and_duplicates() {
        let a = ValuesMap::of(PayloadType::GROUP, ["north"]);
        let b = ValuesMap::of(PayloadType::GROUP, ["south"]);
        let x: Url = "https://example.com/a".parse().unwrap();
        let y: Url = "https://example.com/b".parse().unwrap();
        let one = Program::builder("p")
            .targets([a.clone(), b.clone()])
            .program_description(x.clone())
            .program_description(y.clone())
            .build();
        let two = Program::builder("p")
            .targets([b.clone(), a.clone(), a])
            .program_description(y)
            .program_description(x.clone())
            .program_description(x)
            .build();
        assert_eq!(one, two);
        assert_eq!(hash_one(&one), hash_one(&two));
    }

    fn with_descriptors(descriptors: serde_json::Value) -> Program {
        read(&json!({"programName": "p", "payloadDescriptors": descriptors}), &DecodeOptions::default()).unwrap()
    }

    #[test]
    fn payload_descriptor_order_does_not_matter() {
        let price = json!({"objectType": "EVENT_PAYLOAD_DESCRIPTOR", "payloadType": "PRICE", "currency": "USD"});
        let usage = json!({"objectType": "REPORT_PAYLOAD_DESCRIPTOR", "payloadType": "USAGE", "units": "KWH"});
        let a = with_descriptors(json!([price.clone(), usage.clone()]));
        let b = with_descriptors(json!([usage, price.clone()]));
        assert_eq!(a, b);
        assert_eq!(hash_one(&a), hash_one(&b));
        assert_ne!(a, with_descriptors(json!([price])));
    }

    #[test]
    fn duplicate_payload_descriptors_collapse() {
        let price = json!({"objectType": "EVENT_PAYLOAD_DESCRIPTOR", "payloadType": "PRICE", "currency": "USD"});
        let twice = with_descriptors(json!([
            price.clone(),
            {"objectType": "event_payload_descriptor", "payloadType": "price", "currency": "usd"}
        ]));
        let once = with_descriptors(json!([price.clone()]));
        assert_eq!(twice.payload_descriptors().len(), 1);
        assert_eq!(twice, once);
        assert_eq!(hash_one(&twice), hash_one(&once));
        let mut writer = FieldWriter::new();
        twice.write_fields(&mut writer);
        assert_eq!(writer.finish()["payloadDescriptors"], json!([price]));
    }

    #[test]
    fn program_description_uses_url_key() {
        let doc = json!({"programName": "p", "programDescriptions": [{"URL": "https://example.com/terms"}]});
        let program = read(&doc, &DecodeOptions::default()).unwrap();
        assert_eq!(
            program.program_descriptions().iter().next().map(|d| d.url().as_str()),
            Some("https://example.com/terms")
        );
        let bad = json!({"programName": "p", "programDescriptions": [{"URL": "not a url"}]});
        assert!(matches!(
            read(&bad, &DecodeOptions::default()).unwrap_err(),
            DecodeError::InvalidElement { field: "programDescriptions", index: 0, .. }
        ));
    }
}
