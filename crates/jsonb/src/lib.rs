//! Vellum JSONB - binary JSON documents for Vellum.
//!
//! This crate provides:
//!
//! - `JsonbValue`: the decoded JSON value tree with sorted object keys
//! - `JsonbBinary` and `Encoder`: the offset-addressed binary encoding
//! - `JsonbRef`: zero-copy navigation over encoded buffers
//! - `JsonPath`: colon, dot and bracket path expressions and their evaluation
//! - `cast`: typed scalar extraction with strict and lenient modes
//! - `PathStatistics`: leaf-path sampling used to propose virtual columns
//!
//! # Example
//!
//! ```rust
//! use vellum_core::{DataType, Value};
//! use vellum_jsonb::{cast_path, CastMode, JsonPath, JsonbBinary};
//!
//! let doc = JsonbBinary::parse(r#"{"a":{"b":1,"c":[1,2]}}"#).unwrap();
//!
//! let path = JsonPath::parse(":a.c[0]").unwrap();
//! let value = cast_path(doc.as_bytes(), &path, DataType::Int64, CastMode::Strict).unwrap();
//! assert_eq!(value, Value::Int64(1));
//!
//! let missing = JsonPath::parse(":a.c[5]").unwrap();
//! let value = cast_path(doc.as_bytes(), &missing, DataType::Int64, CastMode::Strict).unwrap();
//! assert!(value.is_null());
//! ```

#![no_std]

extern crate alloc;

mod binary;
mod cast;
mod error;
mod format;
mod navigator;
mod number;
pub mod path;
mod stats;
mod text;
mod value;

pub use binary::{EncodeOptions, Encoder, JsonbBinary, NonFinitePolicy};
pub use cast::{cast, cast_path, cast_strict, try_cast, CastMode};
pub use error::{Error, Result};
pub use format::{MAX_CONTAINER_SIZE, MAX_DEPTH};
pub use navigator::{validate, ArrayIter, ContainerRef, JsonbRef, Lookup, ObjectIter};
pub use number::Number;
pub use path::{evaluate, evaluate_to_binary, JsonPath, ParseError, PathStep};
pub use stats::PathStatistics;
pub use value::{JsonbKind, JsonbObject, JsonbValue};
