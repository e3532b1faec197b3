//! Vellum Storage - Row storage with virtual columns for Vellum.
//!
//! This crate provides the storage layer including:
//!
//! - `RowStore`: Row storage that keeps virtual columns in sync on every write
//! - `VirtualColumn`: Typed values materialized from a path into a JSONB column
//! - `JsonAccess`: Typed path reads and their rewrite to virtual columns
//! - `ExtractionPolicy` and `WorkloadTracker`: Automatic materialization
//! - `NdJsonLoader`: Newline-delimited JSON ingestion
//!
//! # Example
//!
//! ```rust
//! use vellum_core::schema::TableBuilder;
//! use vellum_core::{DataType, Row, Value};
//! use vellum_jsonb::{JsonPath, JsonbBinary};
//! use vellum_storage::{JsonAccess, RowStore, VirtualColumnDescriptor};
//!
//! let schema = TableBuilder::new("events")
//!     .unwrap()
//!     .add_column("id", DataType::Int64)
//!     .unwrap()
//!     .add_column("repo", DataType::Jsonb)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! let mut store = RowStore::new(schema);
//!
//! let doc = JsonbBinary::parse(r#"{"name":"vellum","stars":3}"#).unwrap();
//! store.insert(Row::new(1, vec![Value::Int64(1), doc.into()])).unwrap();
//!
//! let path = JsonPath::parse(":name").unwrap();
//! store
//!     .register_virtual_column(VirtualColumnDescriptor::new("repo", path, DataType::String))
//!     .unwrap();
//!
//! let access = JsonAccess::parse("repo", ":name", DataType::String).unwrap();
//! assert_eq!(store.rewrite(&access).unwrap().name(), "repo:name");
//! assert_eq!(store.evaluate(1, &access).unwrap(), Value::String("vellum".into()));
//! ```

#![no_std]

extern crate alloc;

mod error;
pub mod ndjson;
pub mod rewrite;
pub mod row_store;
pub mod virtual_column;
pub mod workload;

pub use error::{Error, Result};
pub use ndjson::NdJsonLoader;
pub use rewrite::{JsonAccess, VirtualColumnRef};
pub use row_store::RowStore;
pub use virtual_column::{Materialized, VirtualColumn, VirtualColumnDescriptor, VirtualColumnSet};
pub use workload::{ExtractionPolicy, WorkloadTracker};
