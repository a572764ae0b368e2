//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Immutable OpenADR 3.0 value objects.
//!
//! Every type is built once, through its decoder, constructor or builder,
//! and computes its structural hash at that point. Collection fields are
//! either order-significant (`Vec`) or order-free ([`crate::UnorderedSet`]),
//! decided per field.

pub mod descriptors;
pub mod entity;
pub mod event;
pub mod interval;
pub mod notification;
pub mod program;
pub mod report;
pub mod subscription;
pub mod values;
pub mod ven;

pub use descriptors::{
    EventPayloadDescriptor, PayloadDescriptor, ReportDescriptor, ReportDescriptorBuilder,
    ReportPayloadDescriptor, ReportPayloadDescriptorBuilder,
};
pub use entity::{ConcreteKind, Entity, ObjectBody, ObjectHeader, ObjectKind, OpenAdrObject};
pub use event::{Event, EventBuilder};
pub use interval::{Interval, IntervalPeriod};
pub use notification::Notification;
pub use program::{Program, ProgramBuilder, ProgramDescription};
pub use report::{Report, ReportBuilder, ResourceReport};
pub use subscription::{ObjectOperation, Subscription};
pub use values::{Point, Value, ValuesMap};
pub use ven::{Resource, VirtualEndNode, VirtualEndNodeBuilder};
