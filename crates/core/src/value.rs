//! Value type definitions for Vellum.
//!
//! This module defines the `Value` enum which represents any value that can be stored
//! in a table cell or produced by casting a JSON sub-value.

use crate::types::DataType;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::hash::{Hash, Hasher};

/// Encoded JSONB document bytes. The encoding itself lives in the jsonb crate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsonbBytes(pub Vec<u8>);

impl JsonbBytes {
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

/// A value that can be stored in a table cell.
#[derive(Clone, Debug)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 8-bit signed integer
    Int8(i8),
    /// 16-bit signed integer
    Int16(i16),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 8-bit unsigned integer
    UInt8(u8),
    /// 16-bit unsigned integer
    UInt16(u16),
    /// 32-bit unsigned integer
    UInt32(u32),
    /// 64-bit unsigned integer
    UInt64(u64),
    /// 64-bit floating point
    Float64(f64),
    /// UTF-8 string
    String(String),
    /// JSONB document
    Jsonb(JsonbBytes),
}

impl Value {
    /// Returns the data type of this value, or None if it's Null.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int8(_) => Some(DataType::Int8),
            Value::Int16(_) => Some(DataType::Int16),
            Value::Int32(_) => Some(DataType::Int32),
            Value::Int64(_) => Some(DataType::Int64),
            Value::UInt8(_) => Some(DataType::UInt8),
            Value::UInt16(_) => Some(DataType::UInt16),
            Value::UInt32(_) => Some(DataType::UInt32),
            Value::UInt64(_) => Some(DataType::UInt64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::String(_) => Some(DataType::String),
            Value::Jsonb(_) => Some(DataType::Jsonb),
        }
    }

    /// Returns true if this value is Null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean value if this is a Boolean, None otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns any integer variant widened to i128, None otherwise.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Int8(v) => Some(*v as i128),
            Value::Int16(v) => Some(*v as i128),
            Value::Int32(v) => Some(*v as i128),
            Value::Int64(v) => Some(*v as i128),
            Value::UInt8(v) => Some(*v as i128),
            Value::UInt16(v) => Some(*v as i128),
            Value::UInt32(v) => Some(*v as i128),
            Value::UInt64(v) => Some(*v as i128),
            _ => None,
        }
    }

    /// Returns the i64 value if this is an Int64, None otherwise.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the f64 value if this is a Float64, None otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a String, None otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Returns the encoded document if this is Jsonb, None otherwise.
    pub fn as_jsonb(&self) -> Option<&[u8]> {
        match self {
            Value::Jsonb(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Builds an integer value of the given type, or None if `v` is out of range.
    pub fn integer(dt: DataType, v: i128) -> Option<Self> {
        let (min, max) = dt.integer_bounds()?;
        if v < min || v > max {
            return None;
        }
        Some(match dt {
            DataType::Int8 => Value::Int8(v as i8),
            DataType::Int16 => Value::Int16(v as i16),
            DataType::Int32 => Value::Int32(v as i32),
            DataType::Int64 => Value::Int64(v as i64),
            DataType::UInt8 => Value::UInt8(v as u8),
            DataType::UInt16 => Value::UInt16(v as u16),
            DataType::UInt32 => Value::UInt32(v as u32),
            _ => Value::UInt64(v as u64),
        })
    }

    /// Tie-break for equal integers of different declared widths so `Ord`
    /// stays consistent with `PartialEq`.
    fn width_rank(&self) -> u8 {
        self.data_type().map(|dt| dt as u8).unwrap_or(0)
    }

    /// Returns a type ordering value for comparing different types.
    fn type_order(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Int8(_)
            | Value::Int16(_)
            | Value::Int32(_)
            | Value::Int64(_)
            | Value::UInt8(_)
            | Value::UInt16(_)
            | Value::UInt32(_)
            | Value::UInt64(_)
            | Value::Float64(_) => 2,
            Value::String(_) => 3,
            Value::Jsonb(_) => 4,
        }
    }
}

/// Orders two floats with NaN greater than every other value.
fn cmp_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => {
                // Handle NaN comparison
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Jsonb(a), Value::Jsonb(b)) => a == b,
            // Integers are equal only within the same declared type
            _ => match (self.as_i128(), other.as_i128()) {
                (Some(a), Some(b)) => self.data_type() == other.data_type() && a == b,
                _ => false,
            },
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::Float64(f) => f.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::Jsonb(j) => j.hash(state),
            other => other.as_i128().hash(state),
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Float64(a), Value::Float64(b)) => cmp_f64(*a, *b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Jsonb(a), Value::Jsonb(b)) => a.cmp(b),
            _ => {
                // Cross-width and integer/float comparisons
                match (self.as_i128(), other.as_i128()) {
                    (Some(a), Some(b)) => a
                        .cmp(&b)
                        .then_with(|| self.width_rank().cmp(&other.width_rank())),
                    (Some(a), None) => match other.as_f64() {
                        Some(b) => cmp_f64(a as f64, b)
                            .then_with(|| self.width_rank().cmp(&other.width_rank())),
                        None => self.type_order().cmp(&other.type_order()),
                    },
                    (None, Some(b)) => match self.as_f64() {
                        Some(a) => cmp_f64(a, b as f64)
                            .then_with(|| self.width_rank().cmp(&other.width_rank())),
                        None => self.type_order().cmp(&other.type_order()),
                    },
                    (None, None) => self.type_order().cmp(&other.type_order()),
                }
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<JsonbBytes> for Value {
    fn from(v: JsonbBytes) -> Self {
        Value::Jsonb(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
