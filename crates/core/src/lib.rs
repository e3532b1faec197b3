//! Vellum Core - Core types and schema definitions for Vellum.
//!
//! This crate provides the foundational types shared by the JSONB and storage
//! crates:
//!
//! - `DataType`: column and cast target types (integers, Float64, Boolean, String, Jsonb)
//! - `Value`: runtime scalar values, including encoded JSONB documents
//! - `Row`: a row of values with a unique identifier
//! - `schema`: table and column definitions
//! - `Error`: error types for schema and row operations
//!
//! # Example
//!
//! ```rust
//! use vellum_core::{DataType, Value, Row};
//! use vellum_core::schema::TableBuilder;
//!
//! let table = TableBuilder::new("events")
//!     .unwrap()
//!     .add_column("id", DataType::Int64)
//!     .unwrap()
//!     .add_column("kind", DataType::String)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let row = Row::new(1, vec![Value::Int64(1), Value::String("PushEvent".into())]);
//!
//! assert!(table.check_row(row.values()).is_ok());
//! assert_eq!(row.get(1), Some(&Value::String("PushEvent".into())));
//! ```

#![no_std]

extern crate alloc;

mod error;
mod row;
pub mod schema;
mod types;
mod value;

pub use error::{Error, Result};
pub use row::{next_row_id, set_next_row_id_if_greater, Row, RowId};
pub use types::DataType;
pub use value::{JsonbBytes, Value};
