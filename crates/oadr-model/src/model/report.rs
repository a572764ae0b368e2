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
use crate::fields::{json_record, Field, FieldReader, FieldWriter, JsonRecord};
use crate::hashing::{cached_hash, HashCode, StructuralHasher};
use crate::ids::{EventId, ProgramId};
use crate::model::descriptors::ReportPayloadDescriptor;
use crate::model::interval::{Interval, IntervalPeriod};

/// Readings of one resource inside a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReport {
    hash: HashCode,
    resource_name: String,
    interval_period: Option<IntervalPeriod>,
    intervals: UnorderedSet<Interval>,
}

cached_hash!(ResourceReport);

impl ResourceReport {
    /// Readings of `resource_name`.
    pub fn new(
        resource_name: impl Into<String>,
        interval_period: Option<IntervalPeriod>,
        intervals: impl IntoIterator<Item = Interval>,
    ) -> Self {
        Self {
            hash: HashCode::default(),
            resource_name: resource_name.into(),
            interval_period,
            intervals: intervals.into_iter().collect(),
        }
        .sealed()
    }

    /// Reporting resource.
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Default period of every interval.
    pub fn interval_period(&self) -> Option<&IntervalPeriod> {
        self.interval_period.as_ref()
    }

    /// Intervals with their readings.
    pub fn intervals(&self) -> &UnorderedSet<Interval> {
        &self.intervals
    }

    fn sealed(mut self) -> Self {
        self.hash = StructuralHasher::new("ResourceReport")
            .field(&self.resource_name)
            .field(&self.interval_period)
            .field(&self.intervals)
            .finish();
        self
    }
}

impl JsonRecord for ResourceReport {
    const KIND: &'static str = "ResourceReport";

    fn read_fields(reader: &mut FieldReader<'_>) -> Field<Self> {
        let resource_name = reader.mandatory("resourceName");
        let interval_period = reader.optional("intervalPeriod");
        let intervals = reader.mandatory_set("intervals");
        Ok(Self {
            hash: HashCode::default(),
            resource_name: resource_name?,
            interval_period: interval_period?,
            intervals: intervals?,
        }
        .sealed())
    }

    fn write_fields(&self, writer: &mut FieldWriter) {
        writer
            .put("resourceName", &self.resource_name)
            .put_opt("intervalPeriod", self.interval_period.as_ref())
            .put_all("intervals", &self.intervals);
    }
}

json_record!(ResourceReport);

/// Report sent by a VEN in answer to an event's report descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    hash: HashCode,
    program_id: ProgramId,
    event_id: EventId,
    client_name: String,
    report_name: Option<String>,
    payload_descriptors: UnorderedSet<ReportPayloadDescriptor>,
    resources: UnorderedSet<ResourceReport>,
}

cached_hash!(Report);

impl Report {
    /// Start building a report of `client_name` for an event.
    pub fn builder(program_id: ProgramId, event_id: EventId, client_name: impl Into<String>) -> ReportBuilder {
        ReportBuilder {
            inner: Self {
                hash: HashCode::default(),
                program_id,
                event_id,
                client_name: client_name.into(),
                report_name: None,
                payload_descriptors: UnorderedSet::new(),
                resources: UnorderedSet::new(),
            },
        }
    }

    /// Builder seeded with this report's fields.
    pub fn to_builder(&self) -> ReportBuilder {
        ReportBuilder { inner: self.clone() }
    }

    /// Program of the event reported on.
    pub fn program_id(&self) -> &ProgramId {
        &self.program_id
    }

    /// Event reported on.
    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// Reporting client.
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Display name.
    pub fn report_name(&self) -> Option<&str> {
        self.report_name.as_deref()
    }

    /// Meaning of the reported payloads.
    pub fn payload_descriptors(&self) -> &UnorderedSet<ReportPayloadDescriptor> {
        &self.payload_descriptors
    }

    /// Per-resource readings.
    pub fn resources(&self) -> &UnorderedSet<ResourceReport> {
        &self.resources
    }

    fn sealed(mut self) -> Self {
        self.hash = StructuralHasher::new("Report")
            .field(&self.program_id)
            .field(&self.event_id)
            .field(&self.client_name)
            .field(&self.report_name)
            .field(&self.payload_descriptors)
            .field(&self.resources)
            .finish();
        self
    }
}

/// Builder for [`Report`].
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    inner: Report,
}

impl ReportBuilder {
    /// Set the display name.
    pub fn report_name(mut self, value: impl Into<String>) -> Self {
        self.inner.report_name = Some(value.into());
        self
    }

    /// Add a payload descriptor.
    pub fn payload_descriptor(mut self, value: ReportPayloadDescriptor) -> Self {
        self.inner.payload_descriptors.insert(value);
        self
    }

    /// Add a resource's readings.
    pub fn resource(mut self, value: ResourceReport) -> Self {
        self.inner.resources.insert(value);
        self
    }

    /// Finish the report.
    pub fn build(self) -> Report {
        self.inner.sealed()
    }
}

impl JsonRecord for Report {
    const KIND: &'static str = "Report";

    fn read_fields(reader: &mut FieldReader<'_>) -> Field<Self> {
        let program_id = reader.mandatory("programID");
        let event_id = reader.mandatory("eventID");
        let client_name = reader.mandatory("clientName");
        let report_name = reader.optional("reportName");
        let payload_descriptors = reader.set("payloadDescriptors");
        let resources = reader.set("resources");
        Ok(Self {
            hash: HashCode::default(),
            program_id: program_id?,
            event_id: event_id?,
            client_name: client_name?,
            report_name: report_name?,
            payload_descriptors: payload_descriptors?,
            resources: resources?,
        }
        .sealed())
    }

    fn write_fields(&self, writer: &mut FieldWriter) {
        writer
            .put("programID", &self.program_id)
            .put("eventID", &self.event_id)
            .put("clientName", &self.client_name)
            .put_opt("reportName", self.report_name.as_ref())
            .put_nonempty("payloadDescriptors", &self.payload_descriptors)
            .put_nonempty("resources", &self.resources);
    }
}
