//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! OpenADR 3.0 object model.
//!
//! Decodes wire documents into immutable values, compares them structurally
//! (set-like collections ignore order, list-like ones do not) and encodes them
//! back to the same wire form.
#![warn(missing_docs)]

pub mod codec;
pub mod collections;
pub mod dispatch;
pub mod enums;
pub mod errors;
pub mod fields;
pub mod hashing;
pub mod ids;
pub mod metrics;
pub mod model;
pub mod numbers;
pub mod time;

pub use codec::{
    decode, decode_as, decode_str, decode_value, decode_value_str, decode_with, encode,
    encode_string, encode_with, Named,
};
pub use collections::UnorderedSet;
pub use enums::{
    Country, Currency, ObjectType, OpenEnum, Operation, PayloadType, ProgramType, ReadingType,
    UnitType,
};
pub use errors::{DecodeError, DecodeResult, ModelError, ModelResult};
pub use fields::{DecodeOptions, ErrorMode, FromJson, ToJson, UnknownVariantPolicy};
pub use hashing::HashCode;
pub use ids::{
    EventId, Identifier, IntervalId, ObjectId, ProgramId, ReportId, ResourceId, SubscriptionId,
    VenId,
};
pub use model::*;
pub use numbers::{Float32, Float64, Percentage};
pub use time::{format_timestamp, parse_timestamp, IsoDuration};
