//! Error types for Vellum core operations.

use crate::types::DataType;
use crate::value::Value;
use alloc::string::String;

/// Result type alias for core operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for schema and row operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A cell holds a value of the wrong type for its column.
    #[error("Type mismatch on column {column}: expected {expected}, got {got:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        got: Option<DataType>,
    },
    /// Null constraint violation.
    #[error("Null constraint violation on column: {column}")]
    NullConstraint { column: String },
    /// Row or record not found.
    #[error("Not found in table {table}: {key:?}")]
    NotFound { table: String, key: Value },
    /// Invalid schema definition.
    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },
    /// Column not found.
    #[error("Column {column} not found in table {table}")]
    ColumnNotFound { table: String, column: String },
    /// Invalid operation.
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },
}

impl Error {
    /// Creates a type mismatch error.
    pub fn type_mismatch(
        column: impl Into<String>,
        expected: DataType,
        got: Option<DataType>,
    ) -> Self {
        Error::TypeMismatch {
            column: column.into(),
            expected,
            got,
        }
    }

    /// Creates a null constraint error.
    pub fn null_constraint(column: impl Into<String>) -> Self {
        Error::NullConstraint {
            column: column.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(table: impl Into<String>, key: Value) -> Self {
        Error::NotFound {
            table: table.into(),
            key,
        }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Error::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates a column not found error.
    pub fn column_not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::ColumnNotFound {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        let err = Error::type_mismatch("age", DataType::Int32, Some(DataType::String));
        assert!(err.to_string().contains("Type mismatch"));
        assert!(err.to_string().contains("INT32"));

        let err = Error::null_constraint("name");
        assert!(err.to_string().contains("name"));

        let err = Error::column_not_found("events", "payload");
        assert!(err.to_string().contains("payload"));
    }

    #[test]
    fn test_error_constructors() {
        let err = Error::not_found("events", Value::Int64(7));
        match err {
            Error::NotFound { table, key } => {
                assert_eq!(table, "events");
                assert_eq!(key, Value::Int64(7));
            }
            _ => panic!("Wrong error type"),
        }
    }
}
