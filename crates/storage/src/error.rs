//! Error types for the storage layer.

use alloc::string::String;

/// Result type alias for storage operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised by row stores and virtual columns.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Schema or row error.
    #[error(transparent)]
    Core(#[from] vellum_core::Error),
    /// Encoding, navigation or cast error.
    #[error(transparent)]
    Jsonb(#[from] vellum_jsonb::Error),
    /// A virtual column with this name is already registered.
    #[error("Virtual column {name} already exists")]
    DuplicateVirtualColumn { name: String },
    /// No virtual column with this name is registered.
    #[error("Virtual column {name} not found")]
    VirtualColumnNotFound { name: String },
}

impl Error {
    /// Creates a duplicate virtual column error.
    pub fn duplicate_virtual_column(name: impl Into<String>) -> Self {
        Error::DuplicateVirtualColumn { name: name.into() }
    }

    /// Creates a virtual column not found error.
    pub fn virtual_column_not_found(name: impl Into<String>) -> Self {
        Error::VirtualColumnNotFound { name: name.into() }
    }
}

impl From<vellum_jsonb::ParseError> for Error {
    fn from(err: vellum_jsonb::ParseError) -> Self {
        Error::Jsonb(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use vellum_core::DataType;
    use vellum_jsonb::{JsonPath, JsonbKind};

    #[test]
    fn test_error_display() {
        let err = Error::duplicate_virtual_column("repo:name");
        assert_eq!(err.to_string(), "Virtual column repo:name already exists");

        let err: Error = vellum_jsonb::Error::type_mismatch(JsonbKind::Object, DataType::Int64).into();
        assert_eq!(err.to_string(), "Cannot cast JSON object to INT64");

        let err: Error = vellum_core::Error::column_not_found("events", "payload").into();
        assert!(err.to_string().contains("payload"));
    }

    #[test]
    fn test_parse_error_conversion() {
        let err: Error = JsonPath::parse("").unwrap_err().into();
        assert!(matches!(err, Error::Jsonb(vellum_jsonb::Error::Path(_))));
    }
}
