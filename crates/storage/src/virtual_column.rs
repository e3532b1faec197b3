//! Virtual columns: typed values materialized from a path into a JSONB column.
//!
//! A virtual column stores, for every row, the strict cast of its path's
//! target. A cast mismatch is stored as NULL and counted, so the column always
//! equals the lenient evaluation of its path.

use crate::error::Result;
use crate::rewrite::{JsonAccess, VirtualColumnRef};
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::{HashMap, HashSet};
use tracing::{debug, trace, warn};
use vellum_core::{DataType, Error as CoreError, Row, RowId, Value};
use vellum_jsonb::{cast_strict, evaluate, CastMode, JsonPath};

/// Definition of a virtual column.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VirtualColumnDescriptor {
    name: String,
    source_column: String,
    path: JsonPath,
    data_type: DataType,
}

impl VirtualColumnDescriptor {
    /// Creates a descriptor named after its column and path, e.g. `repo:name`.
    pub fn new(source_column: impl Into<String>, path: JsonPath, data_type: DataType) -> Self {
        let source_column = source_column.into();
        Self {
            name: format!("{}{}", source_column, path),
            source_column,
            path,
            data_type,
        }
    }

    /// Overrides the generated name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn source_column(&self) -> &str {
        &self.source_column
    }

    #[inline]
    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns true if both compute the same column, path and type.
    pub fn same_definition(&self, other: &Self) -> bool {
        self.source_column == other.source_column
            && self.path == other.path
            && self.data_type == other.data_type
    }

    /// Returns true if `access` reads the same column, path and type.
    pub fn matches(&self, access: &JsonAccess) -> bool {
        self.source_column == access.column()
            && &self.path == access.path()
            && self.data_type == access.target()
    }
}

/// Outcome of materializing one cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Materialized {
    /// The path resolved and the cast succeeded.
    Present(Value),
    /// The cell is NULL, the path is absent or it holds JSON null.
    Absent,
    /// The path resolved but the strict cast failed. Stored as NULL.
    Mismatch,
}

impl Materialized {
    /// The value stored for this outcome.
    pub fn into_value(self) -> Value {
        match self {
            Materialized::Present(value) => value,
            Materialized::Absent | Materialized::Mismatch => Value::Null,
        }
    }
}

/// A registered virtual column and its materialized values.
#[derive(Clone, Debug)]
pub struct VirtualColumn {
    descriptor: VirtualColumnDescriptor,
    source_index: usize,
    values: HashMap<RowId, Value>,
    mismatches: HashSet<RowId>,
}

impl VirtualColumn {
    pub(crate) fn new(descriptor: VirtualColumnDescriptor, source_index: usize) -> Self {
        Self {
            descriptor,
            source_index,
            values: HashMap::new(),
            mismatches: HashSet::new(),
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &VirtualColumnDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Position of the JSONB source column in the table.
    #[inline]
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    /// Computes this column's value for a source cell.
    ///
    /// Corrupt documents are errors; cast failures are `Mismatch`.
    pub fn materialize(&self, cell: &Value) -> Result<Materialized> {
        let bytes = match cell {
            Value::Null => return Ok(Materialized::Absent),
            Value::Jsonb(bytes) => bytes.as_slice(),
            other => {
                return Err(CoreError::type_mismatch(
                    self.descriptor.source_column(),
                    DataType::Jsonb,
                    other.data_type(),
                )
                .into())
            }
        };
        let Some(target) = evaluate(bytes, self.descriptor.path())? else {
            return Ok(Materialized::Absent);
        };
        match cast_strict(target, self.descriptor.data_type()) {
            Ok(Value::Null) => Ok(Materialized::Absent),
            Ok(value) => Ok(Materialized::Present(value)),
            Err(e) if e.is_cast_failure() => Ok(Materialized::Mismatch),
            Err(e) => Err(e.into()),
        }
    }

    /// Materializes the column's value for a whole row.
    pub fn materialize_row(&self, row: &Row) -> Result<Materialized> {
        self.materialize(row.get(self.source_index).unwrap_or(&Value::Null))
    }

    /// Returns the stored value for `row_id`, NULL when none is stored.
    pub fn value(&self, row_id: RowId) -> Value {
        self.values.get(&row_id).cloned().unwrap_or(Value::Null)
    }

    /// Number of rows with a non-NULL value.
    #[inline]
    pub fn non_null_count(&self) -> usize {
        self.values.len()
    }

    /// Number of rows whose strict cast failed.
    #[inline]
    pub fn mismatch_count(&self) -> usize {
        self.mismatches.len()
    }

    /// Returns true if the strict cast failed for `row_id`.
    pub fn is_mismatch(&self, row_id: RowId) -> bool {
        self.mismatches.contains(&row_id)
    }

    /// Materializes every row, failing without side effects on a corrupt cell.
    pub(crate) fn backfill<'a>(&mut self, rows: impl Iterator<Item = &'a Row>) -> Result<()> {
        let mut staged = Vec::new();
        for row in rows {
            staged.push((row.id(), self.materialize_row(row)?));
        }
        for (row_id, outcome) in staged {
            self.apply(row_id, outcome);
        }
        Ok(())
    }

    /// Stores one row's outcome. Returns true when this recorded the column's
    /// first mismatch, which turns off strict rewrites.
    pub(crate) fn apply(&mut self, row_id: RowId, outcome: Materialized) -> bool {
        match outcome {
            Materialized::Present(value) => {
                self.values.insert(row_id, value);
                self.mismatches.remove(&row_id);
            }
            Materialized::Absent => {
                self.values.remove(&row_id);
                self.mismatches.remove(&row_id);
            }
            Materialized::Mismatch => {
                self.values.remove(&row_id);
                if self.mismatches.insert(row_id) && self.mismatches.len() == 1 {
                    warn!(
                        column = self.name(),
                        row = row_id,
                        "type mismatch recorded, strict access no longer rewritten"
                    );
                    return true;
                }
            }
        }
        false
    }

    pub(crate) fn forget(&mut self, row_id: RowId) {
        self.values.remove(&row_id);
        self.mismatches.remove(&row_id);
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
        self.mismatches.clear();
    }
}

/// The virtual columns of one table, in registration order.
#[derive(Clone, Debug, Default)]
pub struct VirtualColumnSet {
    columns: Vec<VirtualColumn>,
}

impl VirtualColumnSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VirtualColumn> {
        self.columns.iter()
    }

    /// Gets a virtual column by name.
    pub fn get(&self, name: &str) -> Option<&VirtualColumn> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the column computing the same column, path and type, if any.
    pub fn find_matching(&self, access: &JsonAccess) -> Option<&VirtualColumn> {
        self.columns.iter().find(|c| c.descriptor().matches(access))
    }

    /// Substitutes a virtual column for `access` when the results are identical.
    ///
    /// Lenient access always matches the stored values. Strict access only does
    /// while no row has failed the cast, since strict evaluation of such a row
    /// raises an error where the column stores NULL.
    pub fn rewrite(&self, access: &JsonAccess) -> Option<VirtualColumnRef> {
        let column = self.find_matching(access)?;
        if access.mode() == CastMode::Strict && column.mismatch_count() > 0 {
            debug!(
                column = column.name(),
                mismatches = column.mismatch_count(),
                "strict access not rewritten"
            );
            return None;
        }
        trace!(column = column.name(), "rewrote json access");
        Some(VirtualColumnRef::new(
            column.name(),
            column.descriptor().data_type(),
        ))
    }

    pub(crate) fn install(&mut self, column: VirtualColumn) {
        self.columns.push(column);
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<VirtualColumn> {
        let pos = self.columns.iter().position(|c| c.name() == name)?;
        Some(self.columns.remove(pos))
    }

    /// Computes every column's value for `row` without storing anything.
    pub(crate) fn stage(&self, row: &Row) -> Result<Vec<Materialized>> {
        self.columns.iter().map(|c| c.materialize_row(row)).collect()
    }

    /// Stores values produced by `stage` for the same column set.
    pub(crate) fn apply(&mut self, row_id: RowId, staged: Vec<Materialized>) {
        for (column, outcome) in self.columns.iter_mut().zip(staged) {
            column.apply(row_id, outcome);
        }
    }

    pub(crate) fn forget(&mut self, row_id: RowId) {
        for column in &mut self.columns {
            column.forget(row_id);
        }
    }

    pub(crate) fn clear(&mut self) {
        for column in &mut self.columns {
            column.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use alloc::vec;
    use vellum_jsonb::JsonbBinary;

    fn doc(text: &str) -> Value {
        JsonbBinary::parse(text).unwrap().into()
    }

    fn column(path: &str, data_type: DataType) -> VirtualColumn {
        let desc = VirtualColumnDescriptor::new("payload", JsonPath::parse(path).unwrap(), data_type);
        VirtualColumn::new(desc, 1)
    }

    #[test]
    fn test_descriptor_name() {
        let desc = VirtualColumnDescriptor::new("repo", JsonPath::parse(":name").unwrap(), DataType::String);
        assert_eq!(desc.name(), "repo:name");
        assert_eq!(desc.source_column(), "repo");

        let desc = desc.with_name("repo_name");
        assert_eq!(desc.name(), "repo_name");
        assert_eq!(desc.path(), &JsonPath::parse("name").unwrap());
    }

    #[test]
    fn test_materialize_outcomes() {
        let col = column(":a.b", DataType::Int64);
        assert_eq!(
            col.materialize(&doc(r#"{"a":{"b":7}}"#)).unwrap(),
            Materialized::Present(Value::Int64(7))
        );
        assert_eq!(col.materialize(&doc(r#"{"a":{}}"#)).unwrap(), Materialized::Absent);
        assert_eq!(col.materialize(&doc(r#"{"a":{"b":null}}"#)).unwrap(), Materialized::Absent);
        assert_eq!(col.materialize(&Value::Null).unwrap(), Materialized::Absent);
        assert_eq!(
            col.materialize(&doc(r#"{"a":{"b":"x"}}"#)).unwrap(),
            Materialized::Mismatch
        );
        assert_eq!(col.materialize(&doc(r#"{"a":[1]}"#)).unwrap(), Materialized::Absent);
    }

    #[test]
    fn test_materialize_rejects_corrupt_cell() {
        let col = column(":a", DataType::Int64);
        let corrupt = Value::Jsonb(vellum_core::JsonbBytes(vec![0xFF, 0xFF, 0xFF, 0xFF]));
        assert!(matches!(col.materialize(&corrupt), Err(Error::Jsonb(_))));
        assert!(matches!(
            col.materialize(&Value::Int64(1)),
            Err(Error::Core(vellum_core::Error::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn test_apply_tracks_mismatches() {
        let mut col = column(":n", DataType::Int8);
        assert!(!col.apply(1, Materialized::Present(Value::Int8(5))));
        assert!(col.apply(2, Materialized::Mismatch));
        assert!(!col.apply(2, Materialized::Mismatch));
        assert!(!col.apply(3, Materialized::Mismatch));
        col.forget(3);
        assert_eq!(col.value(1), Value::Int8(5));
        assert_eq!(col.value(2), Value::Null);
        assert_eq!(col.non_null_count(), 1);
        assert_eq!(col.mismatch_count(), 1);
        assert!(col.is_mismatch(2));

        col.apply(2, Materialized::Present(Value::Int8(1)));
        assert_eq!(col.mismatch_count(), 0);
        col.forget(1);
        assert_eq!(col.value(1), Value::Null);
        assert_eq!(col.non_null_count(), 1);
    }

    #[test]
    fn test_rewrite_rules() {
        let mut set = VirtualColumnSet::new();
        set.install(column(":n", DataType::Int64));

        let strict = JsonAccess::parse("payload", ":n", DataType::Int64).unwrap();
        let lenient = strict.clone().lenient();
        let other_type = JsonAccess::parse("payload", ":n", DataType::Float64).unwrap();

        assert_eq!(set.rewrite(&strict).unwrap().name(), "payload:n");
        assert!(set.rewrite(&lenient).is_some());
        assert!(set.rewrite(&other_type).is_none());

        let row = Row::new(9, vec![Value::Int64(9), doc(r#"{"n":"nine"}"#)]);
        let staged = set.stage(&row).unwrap();
        set.apply(row.id(), staged);

        assert!(set.rewrite(&strict).is_none());
        assert!(set.rewrite(&lenient).is_some());
    }
}
