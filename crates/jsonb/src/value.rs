//! JsonbValue type definitions for Vellum.
//!
//! This module defines the decoded JSON value tree. Objects keep their keys
//! sorted so that the tree and its binary encoding agree on key order.

use crate::number::Number;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

/// A decoded JSON value.
#[derive(Clone, Debug, PartialEq)]
pub enum JsonbValue {
    /// JSON null
    Null,
    /// JSON boolean
    Bool(bool),
    /// JSON number
    Number(Number),
    /// JSON string
    String(String),
    /// JSON array
    Array(Vec<JsonbValue>),
    /// JSON object with sorted keys for O(log n) lookup
    Object(JsonbObject),
}

/// The kind of a JSON value, without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JsonbKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl fmt::Display for JsonbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JsonbKind::Null => "null",
            JsonbKind::Boolean => "boolean",
            JsonbKind::Number => "number",
            JsonbKind::String => "string",
            JsonbKind::Array => "array",
            JsonbKind::Object => "object",
        })
    }
}

/// A JSON object with keys sorted for efficient lookup.
///
/// Inserting an existing key replaces its value, so the last occurrence wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JsonbObject {
    /// Entries stored sorted by key for binary search
    entries: Vec<(String, JsonbValue)>,
}

impl JsonbObject {
    /// Creates a new empty JsonbObject.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates a JsonbObject with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the object is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Gets a value by key using binary search. O(log n)
    pub fn get(&self, key: &str) -> Option<&JsonbValue> {
        self.entries
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|idx| &self.entries[idx].1)
    }

    /// Inserts a key-value pair, maintaining sorted order.
    pub fn insert(&mut self, key: String, value: JsonbValue) {
        match self.entries.binary_search_by(|(k, _)| k.as_str().cmp(&key)) {
            Ok(idx) => {
                self.entries[idx].1 = value;
            }
            Err(idx) => {
                self.entries.insert(idx, (key, value));
            }
        }
    }

    /// Removes a key and returns its value if present.
    pub fn remove(&mut self, key: &str) -> Option<JsonbValue> {
        self.entries
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|idx| self.entries.remove(idx).1)
    }

    /// Returns true if the object contains the given key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .is_ok()
    }

    /// Returns an iterator over the keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> impl Iterator<Item = &JsonbValue> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Returns an iterator over key-value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonbValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, JsonbValue)> for JsonbObject {
    fn from_iter<I: IntoIterator<Item = (String, JsonbValue)>>(iter: I) -> Self {
        let mut obj = JsonbObject::new();
        for (k, v) in iter {
            obj.insert(k, v);
        }
        obj
    }
}

impl JsonbValue {
    /// Returns the kind of this value.
    pub fn kind(&self) -> JsonbKind {
        match self {
            JsonbValue::Null => JsonbKind::Null,
            JsonbValue::Bool(_) => JsonbKind::Boolean,
            JsonbValue::Number(_) => JsonbKind::Number,
            JsonbValue::String(_) => JsonbKind::String,
            JsonbValue::Array(_) => JsonbKind::Array,
            JsonbValue::Object(_) => JsonbKind::Object,
        }
    }

    /// Returns true if this is a null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, JsonbValue::Null)
    }

    /// Returns true if this is an array or object.
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, JsonbValue::Array(_) | JsonbValue::Object(_))
    }

    /// Returns the boolean value if this is a Bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsonbValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the number if this is a Number.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            JsonbValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the number as i64 if it is integral and fits.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_number()
            .and_then(|n| n.as_i128())
            .and_then(|i| i64::try_from(i).ok())
    }

    /// Returns the number as f64.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(|n| n.as_f64())
    }

    /// Returns a reference to the string if this is a String.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonbValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns a reference to the array if this is an Array.
    pub fn as_array(&self) -> Option<&Vec<JsonbValue>> {
        match self {
            JsonbValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Returns a reference to the object if this is an Object.
    pub fn as_object(&self) -> Option<&JsonbObject> {
        match self {
            JsonbValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Gets a value by key if this is an Object.
    pub fn get(&self, key: &str) -> Option<&JsonbValue> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    /// Gets a value by index if this is an Array.
    pub fn get_index(&self, index: usize) -> Option<&JsonbValue> {
        self.as_array().and_then(|arr| arr.get(index))
    }
}

impl From<bool> for JsonbValue {
    fn from(v: bool) -> Self {
        JsonbValue::Bool(v)
    }
}

impl From<i32> for JsonbValue {
    fn from(v: i32) -> Self {
        JsonbValue::Number(Number::Int64(v as i64))
    }
}

impl From<i64> for JsonbValue {
    fn from(v: i64) -> Self {
        JsonbValue::Number(Number::Int64(v))
    }
}

impl From<u64> for JsonbValue {
    fn from(v: u64) -> Self {
        JsonbValue::Number(Number::from(v))
    }
}

impl From<f64> for JsonbValue {
    fn from(v: f64) -> Self {
        JsonbValue::Number(Number::Float64(v))
    }
}

impl From<Number> for JsonbValue {
    fn from(v: Number) -> Self {
        JsonbValue::Number(v)
    }
}

impl From<String> for JsonbValue {
    fn from(v: String) -> Self {
        JsonbValue::String(v)
    }
}

impl From<&str> for JsonbValue {
    fn from(v: &str) -> Self {
        JsonbValue::String(v.to_string())
    }
}

impl From<Vec<JsonbValue>> for JsonbValue {
    fn from(v: Vec<JsonbValue>) -> Self {
        JsonbValue::Array(v)
    }
}

impl From<JsonbObject> for JsonbValue {
    fn from(v: JsonbObject) -> Self {
        JsonbValue::Object(v)
    }
}

impl<T> From<Option<T>> for JsonbValue
where
    T: Into<JsonbValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => JsonbValue::Null,
        }
    }
}
