//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Discriminator-driven variant resolution.
//!
//! Each polymorphic family is a static table from `objectType` to the decoder
//! of the matching variant. Decoders read from a [`FieldReader`] already open
//! on the variant's document, so they share the caller's error mode and
//! failure log. Encoding needs no table: the variant is known from the value.

use crate::enums::ObjectType;
use crate::errors::{DecodeError, DecodeResult};
use crate::fields::{Field, FieldReader};
use crate::model::descriptors::PayloadDescriptor;
use crate::model::entity::{read_body_as, ObjectBody};
use crate::model::event::Event;
use crate::model::program::Program;
use crate::model::report::Report;
use crate::model::subscription::Subscription;
use crate::model::ven::{Resource, VirtualEndNode};

/// Decoder of one variant of `T`.
pub type VariantDecoder<T> = fn(&mut FieldReader<'_>) -> Field<T>;

/// One row of a dispatch table.
pub struct Variant<T> {
    object_type: ObjectType,
    decode: VariantDecoder<T>,
}

impl<T> Variant<T> {
    /// Row mapping `object_type` to `decode`.
    pub const fn new(object_type: ObjectType, decode: VariantDecoder<T>) -> Self {
        Self { object_type, decode }
    }

    /// Discriminator of the row.
    pub fn object_type(&self) -> &ObjectType {
        &self.object_type
    }
}

/// Closed table of the variants of one polymorphic family.
pub struct Dispatcher<T: 'static> {
    family: &'static str,
    variants: &'static [Variant<T>],
}

impl<T: 'static> Dispatcher<T> {
    /// Table named `family` over `variants`.
    pub const fn new(family: &'static str, variants: &'static [Variant<T>]) -> Self {
        Self { family, variants }
    }

    /// Family name, for diagnostics.
    pub fn family(&self) -> &'static str {
        self.family
    }

    /// Decoder registered for `discriminator`, compared without regard to
    /// ASCII case. Resolution never registers anything.
    pub fn resolve(&self, discriminator: &str) -> DecodeResult<VariantDecoder<T>> {
        let wanted = discriminator.trim();
        self.variants
            .iter()
            .find(|variant| variant.object_type.as_str().eq_ignore_ascii_case(wanted))
            .map(|variant| variant.decode)
            .ok_or_else(|| DecodeError::UnknownObjectType(discriminator.to_owned()))
    }

    /// Whether `discriminator` names a variant of this family.
    pub fn accepts(&self, discriminator: &str) -> bool {
        self.resolve(discriminator).is_ok()
    }

    /// Discriminators of every variant, in table order.
    pub fn object_types(&self) -> impl Iterator<Item = &ObjectType> + '_ {
        self.variants.iter().map(Variant::object_type)
    }
}

static OBJECT_BODY_VARIANTS: [Variant<ObjectBody>; 6] = [
    Variant::new(ObjectType::PROGRAM, read_body_as::<Program>),
    Variant::new(ObjectType::EVENT, read_body_as::<Event>),
    Variant::new(ObjectType::REPORT, read_body_as::<Report>),
    Variant::new(ObjectType::SUBSCRIPTION, read_body_as::<Subscription>),
    Variant::new(ObjectType::VEN, read_body_as::<VirtualEndNode>),
    Variant::new(ObjectType::RESOURCE, read_body_as::<Resource>),
];

/// Top-level object kinds; used by `decode` and `Notification.object`.
pub static OBJECT_BODIES: Dispatcher<ObjectBody> = Dispatcher::new("OpenAdrObject", &OBJECT_BODY_VARIANTS);

static PAYLOAD_DESCRIPTOR_VARIANTS: [Variant<PayloadDescriptor>; 2] = [
    Variant::new(ObjectType::EVENT_PAYLOAD_DESCRIPTOR, PayloadDescriptor::read_event),
    Variant::new(ObjectType::REPORT_PAYLOAD_DESCRIPTOR, PayloadDescriptor::read_report),
];

/// Payload descriptor variants; used by `Program.payloadDescriptors`.
pub static PAYLOAD_DESCRIPTORS: Dispatcher<PayloadDescriptor> =
    Dispatcher::new("PayloadDescriptor", &PAYLOAD_DESCRIPTOR_VARIANTS);
