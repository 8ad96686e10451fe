//! Event construction error model.

use thiserror::Error;

/// Result type returned by event constructors.
pub type ConstructionResult<T> = Result<T, ConstructionError>;

/// An event was built incorrectly by its caller.
///
/// These are programming errors: they should surface in tests, not be
/// handled on production code paths.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    /// Construction attributes were not a key/value mapping.
    #[error("event attributes must be an object, got {0}")]
    NotAnObject(String),

    /// One or more required fields were absent (or null).
    #[error("missing required field(s): {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// Fields that the event kind does not declare.
    #[error("unknown field(s): {}", .0.join(", "))]
    UnknownFields(Vec<String>),

    /// A system-owned field was supplied by the caller.
    #[error("field `{0}` is generated by the system and cannot be supplied")]
    ReservedField(String),

    /// A field was present with a value of the wrong shape.
    #[error("invalid value for field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    /// The kind's fields could not be (de)serialized as a whole.
    #[error("invalid payload for `{event_type}`: {reason}")]
    InvalidPayload { event_type: String, reason: String },
}

impl ConstructionError {
    pub fn missing<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingFields(fields.into_iter().map(Into::into).collect())
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Names of the fields this error is about, if any.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::MissingFields(f) | Self::UnknownFields(f) => f.iter().map(String::as_str).collect(),
            Self::ReservedField(f) => vec![f.as_str()],
            Self::InvalidField { field, .. } => vec![field.as_str()],
            Self::NotAnObject(_) | Self::InvalidPayload { .. } => vec![],
        }
    }
}
