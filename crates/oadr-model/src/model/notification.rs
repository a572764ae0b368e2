//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use crate::collections::UnorderedSet;
use crate::dispatch::OBJECT_BODIES;
use crate::enums::{ObjectType, Operation};
use crate::fields::{json_record, Field, FieldReader, FieldWriter, JsonRecord};
use crate::hashing::{cached_hash, HashCode, StructuralHasher};
use crate::model::entity::{ConcreteKind, OpenAdrObject};
use crate::model::values::ValuesMap;

/// Message delivered to a subscriber when an object changes.
///
/// The concrete kind of `object` is given by the sibling `objectType`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    hash: HashCode,
    operation: Operation,
    object: OpenAdrObject,
    targets: UnorderedSet<ValuesMap>,
}

cached_hash!(Notification);

impl Notification {
    /// Notification of `operation` applied to `object`.
    pub fn new(
        operation: Operation,
        object: OpenAdrObject,
        targets: impl IntoIterator<Item = ValuesMap>,
    ) -> Self {
        Self {
            hash: HashCode::default(),
            operation,
            object,
            targets: targets.into_iter().collect(),
        }
        .sealed()
    }

    /// Discriminator of the carried object.
    pub fn object_type(&self) -> ObjectType {
        self.object.object_type()
    }

    /// What happened to the object.
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Changed object.
    pub fn object(&self) -> &OpenAdrObject {
        &self.object
    }

    /// Carried object narrowed to kind `K`.
    pub fn object_as<K: ConcreteKind>(&self) -> Option<&K> {
        self.object.as_kind::<K>()
    }

    /// Targets of the changed object.
    pub fn targets(&self) -> &UnorderedSet<ValuesMap> {
        &self.targets
    }

    fn sealed(mut self) -> Self {
        self.hash = StructuralHasher::new("Notification")
            .field(&self.operation)
            .field(&self.object)
            .field(&self.targets)
            .finish();
        self
    }
}

impl JsonRecord for Notification {
    const KIND: &'static str = "Notification";

    fn read_fields(reader: &mut FieldReader<'_>) -> Field<Self> {
        let object_type = reader.mandatory::<ObjectType>("objectType")?;
        if let Err(err) = OBJECT_BODIES.resolve(object_type.as_str()) {
            return reader.reject(err);
        }
        let operation = reader.mandatory("operation");
        let object = reader.mandatory_with("object", |json, options| {
            OpenAdrObject::decode_with_type(json, options, Some(&object_type))
        });
        let targets = reader.set("targets");
        Ok(Self::new(operation?, object?, targets?))
    }

    fn write_fields(&self, writer: &mut FieldWriter) {
        writer
            .put("objectType", &self.object_type())
            .put("operation", &self.operation)
            .put("object", &self.object)
            .put_nonempty("targets", &self.targets);
    }
}

json_record!(Notification);
