//! Data type definitions for Vellum.
//!
//! This module defines the column types a table cell can hold. JSONB cells carry
//! an encoded document; every other type is a scalar that a JSON sub-value can be
//! cast to.

use core::fmt;

/// Supported data types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Boolean type (true/false)
    Boolean,
    /// 8-bit signed integer
    Int8,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 8-bit unsigned integer
    UInt8,
    /// 16-bit unsigned integer
    UInt16,
    /// 32-bit unsigned integer
    UInt32,
    /// 64-bit unsigned integer
    UInt64,
    /// 64-bit floating point number
    Float64,
    /// UTF-8 string
    String,
    /// Binary-encoded JSON document
    Jsonb,
}

impl DataType {
    /// Returns the SQL-facing name of this type.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Boolean => "BOOLEAN",
            DataType::Int8 => "INT8",
            DataType::Int16 => "INT16",
            DataType::Int32 => "INT32",
            DataType::Int64 => "INT64",
            DataType::UInt8 => "UINT8",
            DataType::UInt16 => "UINT16",
            DataType::UInt32 => "UINT32",
            DataType::UInt64 => "UINT64",
            DataType::Float64 => "FLOAT64",
            DataType::String => "STRING",
            DataType::Jsonb => "JSONB",
        }
    }

    /// Returns whether this is a signed or unsigned integer type.
    pub fn is_integer(&self) -> bool {
        self.integer_bounds().is_some()
    }

    /// Returns the inclusive `(min, max)` range of an integer type.
    pub fn integer_bounds(&self) -> Option<(i128, i128)> {
        match self {
            DataType::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            DataType::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            DataType::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            DataType::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            DataType::UInt8 => Some((0, u8::MAX as i128)),
            DataType::UInt16 => Some((0, u16::MAX as i128)),
            DataType::UInt32 => Some((0, u32::MAX as i128)),
            DataType::UInt64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }

    /// Returns whether this type is nullable by default.
    pub fn is_nullable_by_default(&self) -> bool {
        matches!(self, DataType::Jsonb)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_data_type_equality() {
        assert_eq!(DataType::Int32, DataType::Int32);
        assert_ne!(DataType::Int32, DataType::Int64);
    }

    #[test]
    fn test_nullable_by_default() {
        assert!(!DataType::Boolean.is_nullable_by_default());
        assert!(!DataType::Int32.is_nullable_by_default());
        assert!(!DataType::String.is_nullable_by_default());
        assert!(DataType::Jsonb.is_nullable_by_default());
    }

    #[test]
    fn test_integer_bounds() {
        assert_eq!(DataType::Int8.integer_bounds(), Some((-128, 127)));
        assert_eq!(DataType::UInt64.integer_bounds(), Some((0, u64::MAX as i128)));
        assert_eq!(DataType::Float64.integer_bounds(), None);
        assert!(DataType::UInt16.is_integer());
        assert!(!DataType::String.is_integer());
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::Jsonb.to_string(), "JSONB");
        assert_eq!(DataType::UInt32.to_string(), "UINT32");
    }
}
