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
use crate::enums::{ObjectType, Operation};
use crate::fields::{json_record, Field, FieldReader, FieldWriter, JsonRecord};
use crate::hashing::{cached_hash, HashCode, StructuralHasher};
use crate::ids::ProgramId;
use crate::model::values::ValuesMap;

/// Which operations on which object types a subscriber wants to hear about,
/// and where to deliver the notifications.
///
/// `objects` and `operations` are order-significant lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectOperation {
    hash: HashCode,
    objects: Vec<ObjectType>,
    operations: Vec<Operation>,
    callback_url: Url,
    bearer_token: Option<String>,
}

cached_hash!(ObjectOperation);

impl ObjectOperation {
    /// Subscription entry delivering to `callback_url`.
    pub fn new(
        objects: Vec<ObjectType>,
        operations: Vec<Operation>,
        callback_url: Url,
        bearer_token: Option<String>,
    ) -> Self {
        Self {
            hash: HashCode::default(),
            objects,
            operations,
            callback_url,
            bearer_token,
        }
        .sealed()
    }

    /// Object types of interest.
    pub fn objects(&self) -> &[ObjectType] {
        &self.objects
    }

    /// Operations of interest.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Notification endpoint.
    pub fn callback_url(&self) -> &Url {
        &self.callback_url
    }

    /// Token the VTN presents when calling back.
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    /// Whether a change of `operation` on `object_type` matches this entry.
    pub fn matches(&self, object_type: &ObjectType, operation: &Operation) -> bool {
        self.objects.contains(object_type) && self.operations.contains(operation)
    }

    fn sealed(mut self) -> Self {
        self.hash = StructuralHasher::new("ObjectOperation")
            .field(&self.objects)
            .field(&self.operations)
            .field(&self.callback_url)
            .field(&self.bearer_token)
            .finish();
        self
    }
}

impl JsonRecord for ObjectOperation {
    const KIND: &'static str = "ObjectOperation";

    fn read_fields(reader: &mut FieldReader<'_>) -> Field<Self> {
        let objects = reader.mandatory_list("objects");
        let operations = reader.mandatory_list("operations");
        // `callbackURL` is accepted on input; output always uses `callbackUrl`.
        let callback_url = if reader.raw("callbackUrl").is_none() && reader.raw("callbackURL").is_some() {
            reader.mandatory("callbackURL")
        } else {
            reader.mandatory("callbackUrl")
        };
        let bearer_token = reader.optional("bearerToken");
        Ok(Self::new(objects?, operations?, callback_url?, bearer_token?))
    }

    fn write_fields(&self, writer: &mut FieldWriter) {
        writer
            .put_all("objects", &self.objects)
            .put_all("operations", &self.operations)
            .put("callbackUrl", &self.callback_url)
            .put_opt("bearerToken", self.bearer_token.as_ref());
    }
}

json_record!(ObjectOperation);

/// Standing request of a client to be notified about object changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    hash: HashCode,
    client_name: String,
    program_id: ProgramId,
    object_operations: UnorderedSet<ObjectOperation>,
    targets: UnorderedSet<ValuesMap>,
}

cached_hash!(Subscription);

impl Subscription {
    /// Subscription of `client_name` to objects of `program_id`.
    pub fn new(
        client_name: impl Into<String>,
        program_id: ProgramId,
        object_operations: impl IntoIterator<Item = ObjectOperation>,
        targets: impl IntoIterator<Item = ValuesMap>,
    ) -> Self {
        Self {
            hash: HashCode::default(),
            client_name: client_name.into(),
            program_id,
            object_operations: object_operations.into_iter().collect(),
            targets: targets.into_iter().collect(),
        }
        .sealed()
    }

    /// Subscribing client.
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Program whose objects are watched.
    pub fn program_id(&self) -> &ProgramId {
        &self.program_id
    }

    /// Watched operations and their callbacks.
    pub fn object_operations(&self) -> &UnorderedSet<ObjectOperation> {
        &self.object_operations
    }

    /// Narrowing targets.
    pub fn targets(&self) -> &UnorderedSet<ValuesMap> {
        &self.targets
    }

    fn sealed(mut self) -> Self {
        self.hash = StructuralHasher::new("Subscription")
            .field(&self.client_name)
            .field(&self.program_id)
            .field(&self.object_operations)
            .field(&self.targets)
            .finish();
        self
    }
}

impl JsonRecord for Subscription {
    const KIND: &'static str = "Subscription";

    fn read_fields(reader: &mut FieldReader<'_>) -> Field<Self> {
        let client_name = reader.mandatory("clientName");
        let program_id = reader.mandatory("programID");
        let object_operations = reader.mandatory_set("objectOperations");
        let targets = reader.set("targets");
        Ok(Self {
            hash: HashCode::default(),
            client_name: client_name?,
            program_id: program_id?,
            object_operations: object_operations?,
            targets: targets?,
        }
        .sealed())
    }

    fn write_fields(&self, writer: &mut FieldWriter) {
        writer
            .put("clientName", &self.client_name)
            .put("programID", &self.program_id)
            .put_all("objectOperations", &self.object_operations)
            .put_nonempty("targets", &self.targets);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::PayloadType;
    use crate::errors::DecodeError;
    use crate::fields::{DecodeOptions, FromJson, ToJson};
    use crate::hashing::hash_one;
    use serde_json::json;

    fn callback() -> Url {
        "https://ven.example.com/notify".parse().unwrap()
    }

    #[test]
    fn object_operation_round_trips() {
        let doc = json!({
            "objects": ["EVENT", "PROGRAM"],
            "operations": ["POST", "PUT"],
            "callbackUrl": "https://ven.example.com/notify",
            "bearerToken": "secret"
        });
        let op = ObjectOperation::from_json(&doc, &DecodeOptions::default()).unwrap();
        assert!(op.matches(&ObjectType::EVENT, &Operation::PUT));
        assert!(!op.matches(&ObjectType::REPORT, &Operation::PUT));
        assert_eq!(op.to_json(), doc);
    }

    #[test]
    fn objects_and_operations_are_ordered() {
        let a = ObjectOperation::new(
            vec![ObjectType::EVENT, ObjectType::PROGRAM],
            vec![Operation::POST],
            callback(),
            None,
        );
        let b = ObjectOperation::new(
            vec![ObjectType::PROGRAM, ObjectType::EVENT],
            vec![Operation::POST],
            callback(),
            None,
        );
        assert_ne!(a, b);
        let c = ObjectOperation::new(
            vec![ObjectType::EVENT],
            vec![Operation::POST, Operation::DELETE],
            callback(),
            None,
        );
        let d = ObjectOperation::new(
            vec![ObjectType::EVENT],
            vec![Operation::DELETE, Operation::POST],
            callback(),
            None,
        );
        assert_ne!(c, d);
    }

    #[test]
    fn upper_case_callback_key_is_accepted() {
        let doc = json!({"objects": ["EVENT"], "operations": ["POST"], "callbackURL": "https://ven.example.com/notify"});
        let op = ObjectOperation::from_json(&doc, &DecodeOptions::default()).unwrap();
        assert_eq!(op.callback_url(), &callback());
        assert_eq!(
            op.to_json(),
            json!({"objects": ["EVENT"], "operations": ["POST"], "callbackUrl": "https://ven.example.com/notify"})
        );

        let both = json!({
            "objects": [], "operations": [],
            "callbackUrl": "https://ven.example.com/notify",
            "callbackURL": "https://other.example.com/"
        });
        let op = ObjectOperation::from_json(&both, &DecodeOptions::default()).unwrap();
        assert_eq!(op.callback_url(), &callback());

        let bad = json!({"objects": [], "operations": [], "callbackURL": "::"});
        let err = ObjectOperation::from_json(&bad, &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: "callbackURL", .. }));

        let missing = json!({"objects": [], "operations": []});
        let err = ObjectOperation::from_json(&missing, &DecodeOptions::default()).unwrap_err();
        assert_eq!(err, DecodeError::MissingField { field: "callbackUrl" });
    }

    #[test]
    fn callback_must_be_a_url() {
        let doc = json!({"objects": [], "operations": [], "callbackUrl": "::"});
        let err = ObjectOperation::from_json(&doc, &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: "callbackUrl", .. }));
    }

    #[test]
    fn object_operations_and_targets_are_sets() {
        let events = ObjectOperation::new(vec![ObjectType::EVENT], vec![Operation::POST], callback(), None);
        let programs = ObjectOperation::new(vec![ObjectType::PROGRAM], vec![Operation::PUT], callback(), None);
        let north = ValuesMap::of(PayloadType::GROUP, ["north"]);
        let south = ValuesMap::of(PayloadType::GROUP, ["south"]);
        let program_id = || ProgramId::new("p").unwrap();
        let one = Subscription::new(
            "client",
            program_id(),
            [events.clone(), programs.clone()],
            [north.clone(), south.clone()],
        );
        let two = Subscription::new(
            "client",
            program_id(),
            [programs, events.clone(), events],
            [south, north.clone(), north],
        );
        assert_eq!(one, two);
        assert_eq!(hash_one(&one), hash_one(&two));
    }

    #[test]
    fn object_operations_are_mandatory() {
        let err = FieldReader::decode::<Subscription>(
            &json!({"clientName": "c", "programID": "p"}),
            &DecodeOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, DecodeError::MissingField { field: "objectOperations" });
    }
}
