//! JSON access expressions and their virtual column substitutes.

use crate::error::Result;
use alloc::string::String;
use core::fmt;
use vellum_core::{DataType, Error as CoreError, Value};
use vellum_jsonb::{cast_path, CastMode, JsonPath};

/// A typed read of `column` at `path`, as a query planner would express it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JsonAccess {
    column: String,
    path: JsonPath,
    target: DataType,
    mode: CastMode,
}

impl JsonAccess {
    /// Creates a strict access.
    pub fn new(column: impl Into<String>, path: JsonPath, target: DataType) -> Self {
        Self {
            column: column.into(),
            path,
            target,
            mode: CastMode::Strict,
        }
    }

    /// Creates a strict access from path text.
    pub fn parse(column: impl Into<String>, path: &str, target: DataType) -> Result<Self> {
        Ok(Self::new(column, JsonPath::parse(path)?, target))
    }

    /// Switches to lenient casting.
    pub fn lenient(self) -> Self {
        self.with_mode(CastMode::Lenient)
    }

    pub fn with_mode(mut self, mode: CastMode) -> Self {
        self.mode = mode;
        self
    }

    #[inline]
    pub fn column(&self) -> &str {
        &self.column
    }

    #[inline]
    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    #[inline]
    pub fn target(&self) -> DataType {
        self.target
    }

    #[inline]
    pub fn mode(&self) -> CastMode {
        self.mode
    }

    /// Evaluates the access directly against a source cell.
    pub fn evaluate(&self, cell: &Value) -> Result<Value> {
        match cell {
            Value::Null => Ok(Value::Null),
            Value::Jsonb(bytes) => {
                Ok(cast_path(bytes.as_slice(), &self.path, self.target, self.mode)?)
            }
            other => Err(CoreError::type_mismatch(
                self.column.as_str(),
                DataType::Jsonb,
                other.data_type(),
            )
            .into()),
        }
    }
}

impl fmt::Display for JsonAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let func = match self.mode {
            CastMode::Strict => "CAST",
            CastMode::Lenient => "TRY_CAST",
        };
        write!(f, "{}({}{} AS {})", func, self.column, self.path, self.target)
    }
}

/// A reference to a virtual column that can replace a `JsonAccess`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VirtualColumnRef {
    name: String,
    data_type: DataType,
}

impl VirtualColumnRef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}
