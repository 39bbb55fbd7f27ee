//! Error types for handgate

use thiserror::Error;

/// Result type alias for handgate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised outside the validation pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// JSON encoding error
    #[error("encode error: {0}")]
    Encode(String),

    /// JSON decoding error
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_data() || e.is_syntax() || e.is_eof() {
            Error::Decode(e.to_string())
        } else {
            Error::Encode(e.to_string())
        }
    }
}

/// A single problem found while validating an inbound message.
///
/// The `Display` output is the exact string reported back to the peer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Address pattern is not in the schema registry
    #[error("unrecognized address pattern")]
    UnrecognizedAddress,

    /// Zero arguments
    #[error("argument must not be empty")]
    EmptyArguments,

    /// More than one argument
    #[error("argument must not have more than 1 element")]
    TooManyArguments,

    /// First argument is not a string
    #[error("argument must be of type string")]
    NotAString,

    /// First argument does not hold a JSON object
    #[error("argument must be valid JSON")]
    MalformedJson,

    /// Decoded field has the wrong type
    #[error("{0}")]
    SchemaViolation(SchemaViolation),
}

impl ValidationError {
    /// Coarse error category
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::UnrecognizedAddress => ErrorKind::UnrecognizedAddress,
            ValidationError::EmptyArguments | ValidationError::TooManyArguments => {
                ErrorKind::Arity
            }
            ValidationError::NotAString => ErrorKind::Type,
            ValidationError::MalformedJson => ErrorKind::MalformedJson,
            ValidationError::SchemaViolation(_) => ErrorKind::SchemaViolation,
        }
    }
}

/// Value-level violations found after the payload decoded
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("parsed value must be of type boolean")]
    ExpectedBoolean,

    #[error("payload must contain at least one key")]
    EmptyPayload,

    #[error("position must carry numeric i, x, y, z fields")]
    MalformedPosition,
}

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnrecognizedAddress,
    Arity,
    Type,
    MalformedJson,
    SchemaViolation,
}

/// Join errors the way they are reported on the control channel
pub fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
