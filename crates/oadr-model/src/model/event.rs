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
use crate::ids::ProgramId;
use crate::model::descriptors::{EventPayloadDescriptor, ReportDescriptor};
use crate::model::interval::{Interval, IntervalPeriod};
use crate::model::values::ValuesMap;

/// Instruction or information issued under a program for a period of time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    hash: HashCode,
    program_id: ProgramId,
    event_name: Option<String>,
    priority: Option<u32>,
    targets: UnorderedSet<ValuesMap>,
    report_descriptors: UnorderedSet<ReportDescriptor>,
    payload_descriptors: UnorderedSet<EventPayloadDescriptor>,
    interval_period: Option<IntervalPeriod>,
    intervals: UnorderedSet<Interval>,
}

cached_hash!(Event);

impl Event {
    /// Start building an event of `program_id`.
    pub fn builder(program_id: ProgramId) -> EventBuilder {
        EventBuilder {
            inner: Self {
                hash: HashCode::default(),
                program_id,
                event_name: None,
                priority: None,
                targets: UnorderedSet::new(),
                report_descriptors: UnorderedSet::new(),
                payload_descriptors: UnorderedSet::new(),
                interval_period: None,
                intervals: UnorderedSet::new(),
            },
        }
    }

    /// Builder seeded with this event's fields.
    pub fn to_builder(&self) -> EventBuilder {
        EventBuilder { inner: self.clone() }
    }

    /// Program the event belongs to.
    pub fn program_id(&self) -> &ProgramId {
        &self.program_id
    }

    /// Display name.
    pub fn event_name(&self) -> Option<&str> {
        self.event_name.as_deref()
    }

    /// Relative priority; lower is more important.
    pub fn priority(&self) -> Option<u32> {
        self.priority
    }

    /// Who the event applies to.
    pub fn targets(&self) -> &UnorderedSet<ValuesMap> {
        &self.targets
    }

    /// Reports requested from participants.
    pub fn report_descriptors(&self) -> &UnorderedSet<ReportDescriptor> {
        &self.report_descriptors
    }

    /// Meaning of the interval payloads.
    pub fn payload_descriptors(&self) -> &UnorderedSet<EventPayloadDescriptor> {
        &self.payload_descriptors
    }

    /// Default period of every interval.
    pub fn interval_period(&self) -> Option<&IntervalPeriod> {
        self.interval_period.as_ref()
    }

    /// Intervals with their payloads.
    pub fn intervals(&self) -> &UnorderedSet<Interval> {
        &self.intervals
    }

    fn sealed(mut self) -> Self {
        self.hash = StructuralHasher::new("Event")
            .field(&self.program_id)
            .field(&self.event_name)
            .field(&self.priority)
            .field(&self.targets)
            .field(&self.report_descriptors)
            .field(&self.payload_descriptors)
            .field(&self.interval_period)
            .field(&self.intervals)
            .finish();
        self
    }
}

/// Builder for [`Event`].
#[derive(Debug, Clone)]
pub struct EventBuilder {
    inner: Event,
}

impl EventBuilder {
    /// Set the display name.
    pub fn event_name(mut self, value: impl Into<String>) -> Self {
        self.inner.event_name = Some(value.into());
        self
    }

    /// Set the priority.
    pub fn priority(mut self, value: u32) -> Self {
        self.inner.priority = Some(value);
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

    /// Add a report request.
    pub fn report_descriptor(mut self, value: ReportDescriptor) -> Self {
        self.inner.report_descriptors.insert(value);
        self
    }

    /// Add a payload descriptor.
    pub fn payload_descriptor(mut self, value: EventPayloadDescriptor) -> Self {
        self.inner.payload_descriptors.insert(value);
        self
    }

    /// Set the default interval period.
    pub fn interval_period(mut self, value: IntervalPeriod) -> Self {
        self.inner.interval_period = Some(value);
        self
    }

    /// Add an interval.
    pub fn interval(mut self, value: Interval) -> Self {
        self.inner.intervals.insert(value);
        self
    }

    /// Add several intervals.
    pub fn intervals(mut self, values: impl IntoIterator<Item = Interval>) -> Self {
        self.inner.intervals.extend(values);
        self
    }

    /// Finish the event.
    pub fn build(self) -> Event {
        self.inner.sealed()
    }
}

impl JsonRecord for Event {
    const KIND: &'static str = "Event";

    fn read_fields(reader: &mut FieldReader<'_>) -> Field<Self> {
        let program_id = reader.mandatory("programID");
        let event_name = reader.optional("eventName");
        let priority = reader.optional("priority");
        let targets = reader.set("targets");
        let report_descriptors = reader.set("reportDescriptors");
        let payload_descriptors = reader.set("payloadDescriptors");
        let interval_period = reader.optional("intervalPeriod");
        let intervals = reader.mandatory_set("intervals");
        Ok(Self {
            hash: HashCode::default(),
            program_id: program_id?,
            event_name: event_name?,
            priority: priority?,
            targets: targets?,
            report_descriptors: report_descriptors?,
            payload_descriptors: payload_descriptors?,
            interval_period: interval_period?,
            intervals: intervals?,
        }
        .sealed())
    }

    fn write_fields(&self, writer: &mut FieldWriter) {
        writer
            .put("programID", &self.program_id)
            .put_opt("eventName", self.event_name.as_ref())
            .put_opt("priority", self.priority.as_ref())
            .put_nonempty("targets", &self.targets)
            .put_nonempty("reportDescriptors", &self.report_descriptors)
            .put_nonempty("payloadDescriptors", &self.payload_descriptors)
            .put_opt("intervalPeriod", self.interval_period.as_ref())
            .put_all("intervals", &self.intervals);
    }
}
