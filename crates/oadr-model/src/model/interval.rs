//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};

use crate::fields::{json_record, Field, FieldReader, FieldWriter, JsonRecord};
use crate::hashing::{cached_hash, HashCode, StructuralHasher};
use crate::ids::IntervalId;
use crate::model::values::ValuesMap;
use crate::time::IsoDuration;

/// Time window of an event, interval or report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalPeriod {
    hash: HashCode,
    start: DateTime<Utc>,
    duration: Option<IsoDuration>,
    randomize_start: Option<IsoDuration>,
}

cached_hash!(IntervalPeriod);

impl IntervalPeriod {
    /// Period starting at `start`. An absent `duration` means instantaneous
    /// or unbounded depending on context; an absent `randomize_start` means
    /// no randomisation.
    pub fn new(
        start: DateTime<Utc>,
        duration: Option<IsoDuration>,
        randomize_start: Option<IsoDuration>,
    ) -> Self {
        Self {
            hash: HashCode::default(),
            start,
            duration,
            randomize_start,
        }
        .sealed()
    }

    /// Period of `duration` from `start`.
    pub fn starting(start: DateTime<Utc>, duration: IsoDuration) -> Self {
        Self::new(start, Some(duration), None)
    }

    /// Start time.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Length of the period, if bounded.
    pub fn duration(&self) -> Option<&IsoDuration> {
        self.duration.as_ref()
    }

    /// Randomisation window applied to the start.
    pub fn randomize_start(&self) -> Option<&IsoDuration> {
        self.randomize_start.as_ref()
    }

    fn sealed(mut self) -> Self {
        self.hash = StructuralHasher::new("IntervalPeriod")
            .field(&self.start)
            .field(&self.duration)
            .field(&self.randomize_start)
            .finish();
        self
    }
}

impl JsonRecord for IntervalPeriod {
    const KIND: &'static str = "IntervalPeriod";

    fn read_fields(reader: &mut FieldReader<'_>) -> Field<Self> {
        let start = reader.mandatory("start");
        let duration = reader.optional("duration");
        let randomize_start = reader.optional("randomizeStart");
        Ok(Self::new(start?, duration?, randomize_start?))
    }

    fn write_fields(&self, writer: &mut FieldWriter) {
        writer
            .put("start", &self.start)
            .put_opt("duration", self.duration.as_ref())
            .put_opt("randomizeStart", self.randomize_start.as_ref());
    }
}

/// One interval of an event or report: an id, an optional period override
/// and the payloads in force during it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    hash: HashCode,
    id: IntervalId,
    interval_period: Option<IntervalPeriod>,
    payloads: Vec<ValuesMap>,
}

cached_hash!(Interval);

impl Interval {
    /// Interval `id` carrying `payloads` in order.
    pub fn new(id: impl Into<IntervalId>, interval_period: Option<IntervalPeriod>, payloads: Vec<ValuesMap>) -> Self {
        Self {
            hash: HashCode::default(),
            id: id.into(),
            interval_period,
            payloads,
        }
        .sealed()
    }

    /// Client-chosen id.
    pub fn id(&self) -> IntervalId {
        self.id
    }

    /// Period override; the owning object's period applies when absent.
    pub fn interval_period(&self) -> Option<&IntervalPeriod> {
        self.interval_period.as_ref()
    }

    /// Payloads in wire order.
    pub fn payloads(&self) -> &[ValuesMap] {
        &self.payloads
    }

    fn sealed(mut self) -> Self {
        self.hash = StructuralHasher::new("Interval")
            .field(&self.id)
            .field(&self.interval_period)
            .field(&self.payloads)
            .finish();
        self
    }
}

impl JsonRecord for Interval {
    const KIND: &'static str = "Interval";

    fn read_fields(reader: &mut FieldReader<'_>) -> Field<Self> {
        let id = reader.mandatory::<IntervalId>("id");
        let interval_period = reader.optional("intervalPeriod");
        let payloads = reader.mandatory_list("payloads");
        Ok(Self::new(id?, interval_period?, payloads?))
    }

    fn write_fields(&self, writer: &mut FieldWriter) {
        writer
            .put("id", &self.id)
            .put_opt("intervalPeriod", self.interval_period.as_ref())
            .put_all("payloads", &self.payloads);
    }
}

json_record!(IntervalPeriod, Interval);
