//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use thiserror::Error;

/// Result alias for construction-time invariant checks.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Result alias for every decode entry point.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Invariant violations raised while constructing a value directly.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Identifier or open enumeration text was empty or whitespace only.
    #[error("identifier must not be empty or whitespace")]
    EmptyIdentifier,
    /// Percentage outside the closed range `0..=100`.
    #[error("percentage {0} is outside 0..=100")]
    PercentageOutOfRange(i64),
    /// NaN or an infinity, or a value that overflows its precision.
    #[error("number {0} is not finite or out of range")]
    NonFiniteNumber(f64),
    /// Text that does not match the grammar of its value kind.
    #[error("invalid {kind}: {detail}")]
    InvalidValue {
        /// Value kind, e.g. `duration`.
        kind: &'static str,
        /// Parser diagnostic.
        detail: String,
    },
}

/// Failure raised while decoding a wire document.
///
/// Decoding never yields partial objects: any of these aborts the whole decode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// An identifier or open enumeration field was empty or whitespace.
    #[error("identifier must not be empty or whitespace")]
    EmptyIdentifier,
    /// A mandatory field is absent (or `null`).
    #[error("missing mandatory field '{field}'")]
    MissingField {
        /// Wire name of the field.
        field: &'static str,
    },
    /// A field is present but its value failed to parse.
    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        /// Wire name of the field.
        field: &'static str,
        /// Underlying failure.
        #[source]
        reason: Box<DecodeError>,
    },
    /// One element of a collection field failed to parse.
    #[error("invalid element {index} of '{field}': {reason}")]
    InvalidElement {
        /// Wire name of the collection field.
        field: &'static str,
        /// Zero-based position inside the wire array.
        index: usize,
        /// Underlying failure.
        #[source]
        reason: Box<DecodeError>,
    },
    /// A discriminator named no known variant.
    #[error("unknown objectType '{0}'")]
    UnknownObjectType(String),
    /// The input was not a JSON object or not JSON at all.
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    /// Leaf parse failure of a scalar (wrong JSON type, bad timestamp, ...).
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// Every field failure of one object, in field order. Accumulate mode only.
    #[error("{} field errors: {}", .0.len(), summarize(.0))]
    Multiple(Vec<DecodeError>),
}

impl DecodeError {
    pub(crate) fn invalid_field(field: &'static str, reason: DecodeError) -> Self {
        DecodeError::InvalidField {
            field,
            reason: Box::new(reason),
        }
    }

    pub(crate) fn invalid_element(field: &'static str, index: usize, reason: DecodeError) -> Self {
        DecodeError::InvalidElement {
            field,
            index,
            reason: Box::new(reason),
        }
    }

    pub(crate) fn wrong_type(expected: &str, found: &serde_json::Value) -> Self {
        DecodeError::InvalidValue(format!("expected {}, found {}", expected, json_kind(found)))
    }

    /// Innermost error of an `InvalidField` / `InvalidElement` chain.
    pub fn root_cause(&self) -> &DecodeError {
        match self {
            DecodeError::InvalidField { reason, .. }
            | DecodeError::InvalidElement { reason, .. } => reason.root_cause(),
            other => other,
        }
    }

    /// Flatten `Multiple` into its members; any other error yields itself.
    pub fn errors(&self) -> Vec<&DecodeError> {
        match self {
            DecodeError::Multiple(errors) => errors.iter().collect(),
            other => vec![other],
        }
    }
}

impl From<ModelError> for DecodeError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::EmptyIdentifier => DecodeError::EmptyIdentifier,
            other => DecodeError::InvalidValue(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::MalformedDocument(err.to_string())
    }
}

fn summarize(errors: &[DecodeError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_cause_walks_nested_failures() {
        let err = DecodeError::invalid_field(
            "intervals",
            DecodeError::invalid_element("payloads", 2, DecodeError::MissingField { field: "type" }),
        );
        assert_eq!(err.root_cause(), &DecodeError::MissingField { field: "type" });
        assert!(err.to_string().contains("invalid element 2 of 'payloads'"));
    }

    #[test]
    fn model_errors_map_onto_decode_taxonomy() {
        assert_eq!(
            DecodeError::from(ModelError::EmptyIdentifier),
            DecodeError::EmptyIdentifier
        );
        let mapped = DecodeError::from(ModelError::PercentageOutOfRange(120));
        assert!(matches!(mapped, DecodeError::InvalidValue(ref msg) if msg.contains("120")));
    }

    #[test]
    fn multiple_lists_every_member() {
        let err = DecodeError::Multiple(vec![
            DecodeError::MissingField { field: "programID" },
            DecodeError::MissingField { field: "intervals" },
        ]);
        let text = err.to_string();
        assert!(text.starts_with("2 field errors"));
        assert!(text.contains("programID") && text.contains("intervals"));
        assert_eq!(err.errors().len(), 2);
    }
}
