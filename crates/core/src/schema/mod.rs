//! Schema module for Vellum.
//!
//! This module contains table and column definitions.

mod column;
mod table;

pub use column::Column;
pub use table::{Table, TableBuilder};
