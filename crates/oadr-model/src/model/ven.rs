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
use crate::fields::{Field, FieldReader, FieldWriter, JsonRecord};
use crate::hashing::{cached_hash, HashCode, StructuralHasher};
use crate::ids::VenId;
use crate::model::entity::Entity;
use crate::model::values::ValuesMap;

/// Device or device group behind a VEN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    hash: HashCode,
    resource_name: String,
    ven_id: Option<VenId>,
    attributes: UnorderedSet<ValuesMap>,
    targets: UnorderedSet<ValuesMap>,
}

cached_hash!(Resource);

impl Resource {
    /// Resource called `resource_name`.
    pub fn new(
        resource_name: impl Into<String>,
        ven_id: Option<VenId>,
        attributes: impl IntoIterator<Item = ValuesMap>,
        targets: impl IntoIterator<Item = ValuesMap>,
    ) -> Self {
        Self {
            hash: HashCode::default(),
            resource_name: resource_name.into(),
            ven_id,
            attributes: attributes.into_iter().collect(),
            targets: targets.into_iter().collect(),
        }
        .sealed()
    }

    /// Resource name, unique per VEN.
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Owning VEN.
    pub fn ven_id(&self) -> Option<&VenId> {
        self.ven_id.as_ref()
    }

    /// Descriptive attributes such as location or capacity.
    pub fn attributes(&self) -> &UnorderedSet<ValuesMap> {
        &self.attributes
    }

    /// Target values the resource answers to.
    pub fn targets(&self) -> &UnorderedSet<ValuesMap> {
        &self.targets
    }

    fn sealed(mut self) -> Self {
        self.hash = StructuralHasher::new("Resource")
            .field(&self.resource_name)
            .field(&self.ven_id)
            .field(&self.attributes)
            .field(&self.targets)
            .finish();
        self
    }
}

impl JsonRecord for Resource {
    const KIND: &'static str = "Resource";

    fn read_fields(reader: &mut FieldReader<'_>) -> Field<Self> {
        let resource_name = reader.mandatory("resourceName");
        let ven_id = reader.optional("venID");
        let attributes = reader.set("attributes");
        let targets = reader.set("targets");
        Ok(Self {
            hash: HashCode::default(),
            resource_name: resource_name?,
            ven_id: ven_id?,
            attributes: attributes?,
            targets: targets?,
        }
        .sealed())
    }

    fn write_fields(&self, writer: &mut FieldWriter) {
        writer
            .put("resourceName", &self.resource_name)
            .put_opt("venID", self.ven_id.as_ref())
            .put_nonempty("attributes", &self.attributes)
            .put_nonempty("targets", &self.targets);
    }
}

/// Client-side party (VEN) with its resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualEndNode {
    hash: HashCode,
    ven_name: String,
    attributes: UnorderedSet<ValuesMap>,
    targets: UnorderedSet<ValuesMap>,
    resources: UnorderedSet<Entity<Resource>>,
}

cached_hash!(VirtualEndNode);

impl VirtualEndNode {
    /// Start building a VEN called `ven_name`.
    pub fn builder(ven_name: impl Into<String>) -> VirtualEndNodeBuilder {
        VirtualEndNodeBuilder {
            inner: Self {
                hash: HashCode::default(),
                ven_name: ven_name.into(),
                attributes: UnorderedSet::new(),
                targets: UnorderedSet::new(),
                resources: UnorderedSet::new(),
            },
        }
    }

    /// Builder seeded with this VEN's fields.
    pub fn to_builder(&self) -> VirtualEndNodeBuilder {
        VirtualEndNodeBuilder { inner: self.clone() }
    }

    /// VEN name, unique per VTN.
    pub fn ven_name(&self) -> &str {
        &self.ven_name
    }

    /// Descriptive attributes.
    pub fn attributes(&self) -> &UnorderedSet<ValuesMap> {
        &self.attributes
    }

    /// Target values the VEN answers to.
    pub fn targets(&self) -> &UnorderedSet<ValuesMap> {
        &self.targets
    }

    /// Resources behind the VEN.
    pub fn resources(&self) -> &UnorderedSet<Entity<Resource>> {
        &self.resources
    }

    /// Resource called `name`, if any.
    pub fn resource(&self, name: &str) -> Option<&Entity<Resource>> {
        self.resources.find(|r| r.body().resource_name() == name)
    }

    fn sealed(mut self) -> Self {
        self.hash = StructuralHasher::new("VirtualEndNode")
            .field(&self.ven_name)
            .field(&self.attributes)
            .field(&self.targets)
            .field(&self.resources)
            .finish();
        self
    }
}

/// Builder for [`VirtualEndNode`].
#[derive(Debug, Clone)]
pub struct VirtualEndNodeBuilder {
    inner: VirtualEndNode,
}

impl VirtualEndNodeBuilder {
    /// Add an attribute.
    pub fn attribute(mut self, value: ValuesMap) -> Self {
        self.inner.attributes.insert(value);
        self
    }

    /// Add a target.
    pub fn target(mut self, value: ValuesMap) -> Self {
        self.inner.targets.insert(value);
        self
    }

    /// Add a resource.
    pub fn resource(mut self, value: impl Into<Entity<Resource>>) -> Self {
        self.inner.resources.insert(value.into());
        self
    }

    /// Finish the VEN.
    pub fn build(self) -> VirtualEndNode {
        self.inner.sealed()
    }
}

impl JsonRecord for VirtualEndNode {
    const KIND: &'static str = "VirtualEndNode";

    fn read_fields(reader: &mut FieldReader<'_>) -> Field<Self> {
        let ven_name = reader.mandatory("venName");
        let attributes = reader.set("attributes");
        let targets = reader.set("targets");
        let resources = reader.set("resources");
        Ok(Self {
            hash: HashCode::default(),
            ven_name: ven_name?,
            attributes: attributes?,
            targets: targets?,
            resources: resources?,
        }
        .sealed())
    }

    fn write_fields(&self, writer: &mut FieldWriter) {
        writer
            .put("venName", &self.ven_name)
            .put_nonempty("attributes", &self.attributes)
            .put_nonempty("targets", &self.targets)
            .put_nonempty("resources", &self.resources);
    }
}
