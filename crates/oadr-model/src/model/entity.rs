//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Top-level objects: a shared identity header plus a per-kind body.
//!
//! [`Entity<B>`] carries `id`, `createdDateTime` and `modificationDateTime`
//! once for every kind. `B` is either one concrete body ([`Program`],
//! [`Event`], ...) or [`ObjectBody`], the closed sum over all six; the latter
//! is [`OpenAdrObject`], what the transport-facing `decode` returns.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::dispatch::OBJECT_BODIES;
use crate::enums::ObjectType;
use crate::errors::{DecodeError, DecodeResult};
use crate::fields::{DecodeOptions, Field, FieldReader, FieldWriter, FromJson, JsonRecord, ToJson};
use crate::hashing::{HashCode, StructuralHasher};
use crate::ids::ObjectId;
use crate::model::event::Event;
use crate::model::program::Program;
use crate::model::report::Report;
use crate::model::subscription::Subscription;
use crate::model::ven::{Resource, VirtualEndNode};

/// Identity fields assigned by the issuing server; all absent on objects a
/// client submits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ObjectHeader {
    /// Server-assigned id.
    pub id: Option<ObjectId>,
    /// Creation time.
    pub created: Option<DateTime<Utc>>,
    /// Last modification time.
    pub last_modification: Option<DateTime<Utc>>,
}

impl ObjectHeader {
    /// Header with every field set.
    pub fn new(id: ObjectId, created: DateTime<Utc>, last_modification: DateTime<Utc>) -> Self {
        Self {
            id: Some(id),
            created: Some(created),
            last_modification: Some(last_modification),
        }
    }

    /// Whether no identity has been assigned yet.
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.created.is_none() && self.last_modification.is_none()
    }
}

/// Body of a top-level object kind.
pub trait ObjectKind: Clone + Eq + Hash + fmt::Debug + Sized + 'static {
    /// Name used in diagnostics and metric labels.
    const KIND: &'static str;

    /// Discriminator of this body.
    fn object_type(&self) -> ObjectType;

    /// Read the body fields given the discriminator found for the object,
    /// if any.
    fn read_body(reader: &mut FieldReader<'_>, object_type: Option<&ObjectType>) -> Field<Self>;

    /// Emit the body fields.
    fn write_body(&self, writer: &mut FieldWriter);
}

/// One of the six concrete object kinds.
pub trait ConcreteKind: ObjectKind + JsonRecord {
    /// Discriminator of the kind.
    const OBJECT_TYPE: ObjectType;

    /// Wrap into the sum type.
    fn into_body(self) -> ObjectBody;

    /// Unwrap from the sum type; the body is handed back on mismatch.
    fn from_body(body: ObjectBody) -> Result<Self, ObjectBody>;

    /// Borrow from the sum type.
    fn from_body_ref(body: &ObjectBody) -> Option<&Self>;
}

/// Sum over every top-level object kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectBody {
    /// `PROGRAM`.
    Program(Program),
    /// `EVENT`.
    Event(Event),
    /// `REPORT`.
    Report(Report),
    /// `SUBSCRIPTION`.
    Subscription(Subscription),
    /// `VEN`.
    VirtualEndNode(VirtualEndNode),
    /// `RESOURCE`.
    Resource(Resource),
}

macro_rules! concrete_kinds {
    ($($ty:ident => $object_type:ident),* $(,)?) => {
        $(
            impl ObjectKind for $ty {
                const KIND: &'static str = stringify!($ty);

                fn object_type(&self) -> ObjectType {
                    ObjectType::$object_type
                }

                fn read_body(reader: &mut FieldReader<'_>, object_type: Option<&ObjectType>) -> Field<Self> {
                    match object_type {
                        Some(found) if *found != ObjectType::$object_type => {
                            reader.reject(DecodeError::UnknownObjectType(found.to_string()))
                        }
                        _ => <$ty as JsonRecord>::read_fields(reader),
                    }
                }

                fn write_body(&self, writer: &mut FieldWriter) {
                    <$ty as JsonRecord>::write_fields(self, writer);
                }
            }

            impl ConcreteKind for $ty {
                const OBJECT_TYPE: ObjectType = ObjectType::$object_type;

                fn into_body(self) -> ObjectBody {
                    ObjectBody::$ty(self)
                }

                fn from_body(body: ObjectBody) -> Result<Self, ObjectBody> {
                    match body {
                        ObjectBody::$ty(value) => Ok(value),
                        other => Err(other),
                    }
                }

                fn from_body_ref(body: &ObjectBody) -> Option<&Self> {
                    match body {
                        ObjectBody::$ty(value) => Some(value),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for ObjectBody {
                fn from(value: $ty) -> Self {
                    ObjectBody::$ty(value)
                }
            }
        )*
    };
}

concrete_kinds! {
    Program => PROGRAM,
    Event => EVENT,
    Report => REPORT,
    Subscription => SUBSCRIPTION,
    VirtualEndNode => VEN,
    Resource => RESOURCE,
}

/// Body decoder of kind `K`, as stored in the dispatch table.
pub(crate) fn read_body_as<K: ConcreteKind>(reader: &mut FieldReader<'_>) -> Field<ObjectBody> {
    K::read_fields(reader).map(K::into_body)
}

impl ObjectKind for ObjectBody {
    const KIND: &'static str = "OpenAdrObject";

    fn object_type(&self) -> ObjectType {
        match self {
            ObjectBody::Program(_) => ObjectType::PROGRAM,
            ObjectBody::Event(_) => ObjectType::EVENT,
            ObjectBody::Report(_) => ObjectType::REPORT,
            ObjectBody::Subscription(_) => ObjectType::SUBSCRIPTION,
            ObjectBody::VirtualEndNode(_) => ObjectType::VEN,
            ObjectBody::Resource(_) => ObjectType::RESOURCE,
        }
    }

    fn read_body(reader: &mut FieldReader<'_>, object_type: Option<&ObjectType>) -> Field<Self> {
        let Some(object_type) = object_type else {
            return reader.reject(DecodeError::MissingField { field: "objectType" });
        };
        match OBJECT_BODIES.resolve(object_type.as_str()) {
            Ok(decode) => decode(reader),
            Err(err) => reader.reject(err),
        }
    }

    fn write_body(&self, writer: &mut FieldWriter) {
        match self {
            ObjectBody::Program(body) => body.write_fields(writer),
            ObjectBody::Event(body) => body.write_fields(writer),
            ObjectBody::Report(body) => body.write_fields(writer),
            ObjectBody::Subscription(body) => body.write_fields(writer),
            ObjectBody::VirtualEndNode(body) => body.write_fields(writer),
            ObjectBody::Resource(body) => body.write_fields(writer),
        }
    }
}

/// Top-level object: identity header plus a body of kind `B`.
///
/// Equality covers the header too: an object with an `id` never equals the
/// same body without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity<B> {
    hash: HashCode,
    header: ObjectHeader,
    body: B,
}

/// Any top-level object, as produced by [`crate::decode`].
pub type OpenAdrObject = Entity<ObjectBody>;

impl<B: ObjectKind> Entity<B> {
    /// Object without identity, as a client submits it.
    pub fn new(body: B) -> Self {
        Self::with_header(ObjectHeader::default(), body)
    }

    /// Object with an explicit header.
    pub fn with_header(header: ObjectHeader, body: B) -> Self {
        let hash = StructuralHasher::new(B::KIND)
            .field(&header)
            .field(&body)
            .finish();
        Self { hash, header, body }
    }

    /// Copy of this object carrying the given identity.
    pub fn with_identity(&self, id: ObjectId, created: DateTime<Utc>, last_modification: DateTime<Utc>) -> Self {
        Self::with_header(ObjectHeader::new(id, created, last_modification), self.body.clone())
    }

    /// Identity header.
    pub fn header(&self) -> &ObjectHeader {
        &self.header
    }

    /// Kind-specific fields.
    pub fn body(&self) -> &B {
        &self.body
    }

    /// Drop the header.
    pub fn into_body(self) -> B {
        self.body
    }

    /// Split into header and body.
    pub fn into_parts(self) -> (ObjectHeader, B) {
        (self.header, self.body)
    }

    /// Discriminator of the body.
    pub fn object_type(&self) -> ObjectType {
        self.body.object_type()
    }

    /// Server-assigned id.
    pub fn id(&self) -> Option<&ObjectId> {
        self.header.id.as_ref()
    }

    /// Creation time.
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.header.created
    }

    /// Last modification time.
    pub fn last_modification(&self) -> Option<DateTime<Utc>> {
        self.header.last_modification
    }

    /// Read header and body from `reader`. `expected` is a discriminator
    /// imposed from outside, e.g. by a notification; the object's own
    /// `objectType`, when present, must agree with it.
    pub(crate) fn read_fields(reader: &mut FieldReader<'_>, expected: Option<&ObjectType>) -> Field<Self> {
        let id = reader.optional("id");
        let created = reader.optional("createdDateTime");
        let last_modification = reader.optional("modificationDateTime");
        let own = reader.optional::<ObjectType>("objectType")?;
        let object_type = match (expected, own) {
            (Some(expected), Some(own)) if *expected != own => {
                return reader.reject(DecodeError::UnknownObjectType(own.to_string()));
            }
            (Some(expected), _) => Some(expected.clone()),
            (None, own) => own,
        };
        let body = B::read_body(reader, object_type.as_ref());
        let header = ObjectHeader {
            id: id?,
            created: created?,
            last_modification: last_modification?,
        };
        Ok(Self::with_header(header, body?))
    }

    /// Decode a document whose discriminator is imposed by the caller.
    pub(crate) fn decode_with_type(
        json: &JsonValue,
        options: &DecodeOptions,
        expected: Option<&ObjectType>,
    ) -> DecodeResult<Self> {
        let mut reader = FieldReader::open(B::KIND, json, options)?;
        let value = Self::read_fields(&mut reader, expected);
        reader.finish()?;
        Ok(value?)
    }
}

impl<K: ConcreteKind> Entity<K> {
    /// Widen to the sum type.
    pub fn upcast(self) -> OpenAdrObject {
        Entity::with_header(self.header, self.body.into_body())
    }
}

impl OpenAdrObject {
    /// Narrow to kind `K`; the object is handed back on mismatch.
    pub fn downcast<K: ConcreteKind>(self) -> Result<Entity<K>, OpenAdrObject> {
        let (header, body) = self.into_parts();
        match K::from_body(body) {
            Ok(body) => Ok(Entity::with_header(header, body)),
            Err(body) => Err(Entity::with_header(header, body)),
        }
    }

    /// Borrow the body as kind `K`.
    pub fn as_kind<K: ConcreteKind>(&self) -> Option<&K> {
        K::from_body_ref(&self.body)
    }
}

impl<B> Hash for Entity<B> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl<B> Deref for Entity<B> {
    type Target = B;

    fn deref(&self) -> &B {
        &self.body
    }
}

impl<K: ConcreteKind> From<K> for Entity<K> {
    fn from(body: K) -> Self {
        Entity::new(body)
    }
}

impl<B: ObjectKind> FromJson for Entity<B> {
    fn from_json(json: &JsonValue, options: &DecodeOptions) -> DecodeResult<Self> {
        Self::decode_with_type(json, options, None)
    }
}

impl<B: ObjectKind> ToJson for Entity<B> {
    fn to_json(&self) -> JsonValue {
        let mut writer = FieldWriter::new();
        writer
            .put("objectType", &self.object_type())
            .put_opt("id", self.header.id.as_ref())
            .put_opt("createdDateTime", self.header.created.as_ref())
            .put_opt("modificationDateTime", self.header.last_modification.as_ref());
        self.body.write_body(&mut writer);
        writer.finish()
    }
}

impl<B: ObjectKind> serde::Serialize for Entity<B> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.to_json(), serializer)
    }
}

impl<'de, B: ObjectKind> serde::Deserialize<'de> for Entity<B> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = <JsonValue as serde::Deserialize>::deserialize(deserializer)?;
        Self::from_json(&json, &DecodeOptions::default()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::hash_one;
    use crate::ids::ProgramId;
    use chrono::TimeZone;
    use serde_json::json;

    fn stamp(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 15, hour, 0, 0).unwrap()
    }

    #[test]
    fn header_takes_part_in_equality() {
        let bare = Entity::new(Program::builder("p").build());
        let issued = bare.with_identity(ObjectId::new("obj-1").unwrap(), stamp(9), stamp(10));
        assert_ne!(bare, issued);
        assert_eq!(issued.id().map(|id| id.as_str()), Some("obj-1"));
        assert_eq!(issued.created(), Some(stamp(9)));
        assert_eq!(issued.body(), bare.body());
        let again = bare.with_identity(ObjectId::new("OBJ-1").unwrap(), stamp(9), stamp(10));
        assert_eq!(issued, again);
        assert_eq!(hash_one(&issued), hash_one(&again));
    }

    #[test]
    fn header_round_trips() {
        let doc = json!({
            "objectType": "PROGRAM",
            "id": "obj-1",
            "createdDateTime": "2023-06-15T09:00:00.000Z",
            "modificationDateTime": "2023-06-15T10:00:00.000Z",
            "programName": "p"
        });
        let program = Entity::<Program>::from_json(&doc, &DecodeOptions::default()).unwrap();
        assert_eq!(program.program_name(), "p");
        assert_eq!(program.last_modification(), Some(stamp(10)));
        assert_eq!(program.to_json(), doc);
    }

    #[test]
    fn sum_type_requires_a_discriminator() {
        let err = OpenAdrObject::from_json(&json!({"programName": "p"}), &DecodeOptions::default())
            .unwrap_err();
        assert_eq!(err, DecodeError::MissingField { field: "objectType" });
    }

    #[test]
    fn sum_type_dispatches_on_discriminator() {
        let doc = json!({"objectType": "event", "programID": "p", "intervals": []});
        let object = OpenAdrObject::from_json(&doc, &DecodeOptions::default()).unwrap();
        assert_eq!(object.object_type(), ObjectType::EVENT);
        let event = object.as_kind::<Event>().unwrap();
        assert_eq!(event.program_id(), &ProgramId::new("p").unwrap());
        assert!(object.as_kind::<Program>().is_none());
    }

    #[test]
    fn unknown_discriminator_is_reported_verbatim() {
        let doc = json!({"objectType": "WIDGET", "programName": "p"});
        let err = OpenAdrObject::from_json(&doc, &DecodeOptions::default()).unwrap_err();
        assert_eq!(err, DecodeError::UnknownObjectType("WIDGET".into()));
    }

    #[test]
    fn typed_decode_rejects_other_kinds() {
        let doc = json!({"objectType": "EVENT", "programName": "p"});
        let err = Entity::<Program>::from_json(&doc, &DecodeOptions::default()).unwrap_err();
        assert_eq!(err, DecodeError::UnknownObjectType("EVENT".into()));
    }

    #[test]
    fn upcast_and_downcast_preserve_equality() {
        let typed = Entity::new(Program::builder("p").build())
            .with_identity(ObjectId::new("x").unwrap(), stamp(1), stamp(2));
        let object = typed.clone().upcast();
        assert_eq!(object.object_type(), ObjectType::PROGRAM);
        assert_eq!(object.id(), typed.id());
        let back = object.clone().downcast::<Program>().unwrap();
        assert_eq!(back, typed);
        assert_eq!(object.downcast::<Event>().unwrap_err().object_type(), ObjectType::PROGRAM);
    }

    #[test]
    fn decoded_and_upcast_objects_are_equal() {
        let typed = Entity::new(Program::builder("p").build());
        let decoded = OpenAdrObject::from_json(&typed.to_json(), &DecodeOptions::default()).unwrap();
        assert_eq!(decoded, typed.upcast());
    }
}
