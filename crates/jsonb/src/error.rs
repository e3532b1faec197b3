//! Error types for JSONB encoding, navigation and casting.

use crate::path::ParseError;
use crate::value::JsonbKind;
use alloc::string::String;
use vellum_core::DataType;

/// Result type alias for JSONB operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised by the JSONB layer.
///
/// Only `Format` means the stored bytes are unusable. `TypeMismatch` and
/// `Overflow` are cast failures that lenient callers turn into SQL NULL.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The buffer is not a well-formed encoding.
    #[error("Invalid JSONB encoding: {message}")]
    Format { message: String },
    /// Input text or tree cannot be encoded.
    #[error("Malformed JSON input: {message}")]
    MalformedInput { message: String },
    /// A JSON kind cannot be converted to the requested type.
    #[error("Cannot cast JSON {found} to {target}")]
    TypeMismatch { found: JsonbKind, target: DataType },
    /// A value does not fit the requested type.
    #[error("Value {value} out of range for {target}")]
    Overflow { value: String, target: DataType },
    /// A container exceeds the encodable size.
    #[error("Container too large: {size} exceeds limit {limit}")]
    TooLarge { size: usize, limit: usize },
    /// Path expression failed to parse.
    #[error("Invalid path expression: {0}")]
    Path(#[from] ParseError),
}

impl Error {
    /// Creates a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Error::Format {
            message: message.into(),
        }
    }

    /// Creates a malformed input error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedInput {
            message: message.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(found: JsonbKind, target: DataType) -> Self {
        Error::TypeMismatch { found, target }
    }

    /// Creates an overflow error.
    pub fn overflow(value: impl Into<String>, target: DataType) -> Self {
        Error::Overflow {
            value: value.into(),
            target,
        }
    }

    /// Returns true for errors a lenient cast maps to NULL.
    pub fn is_cast_failure(&self) -> bool {
        matches!(self, Error::TypeMismatch { .. } | Error::Overflow { .. })
    }
}
