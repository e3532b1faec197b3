//! Row storage for Vellum tables.
//!
//! This module provides the `RowStore` struct which manages the rows of a
//! single table together with its virtual columns. Every write computes all
//! virtual column values first and only then swaps the row in, so a failed
//! write leaves both untouched.

use crate::error::{Error, Result};
use crate::ndjson::NdJsonLoader;
use crate::rewrite::{JsonAccess, VirtualColumnRef};
use crate::virtual_column::{Materialized, VirtualColumn, VirtualColumnDescriptor, VirtualColumnSet};
use crate::workload::{ExtractionPolicy, WorkloadTracker};
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use tracing::debug;
use vellum_core::schema::Table;
use vellum_core::{set_next_row_id_if_greater, DataType, Error as CoreError, Row, RowId, Value};
use vellum_jsonb::{validate, PathStatistics};

/// Row storage for a single table.
#[derive(Clone, Debug)]
pub struct RowStore {
    schema: Table,
    rows: BTreeMap<RowId, Arc<Row>>,
    virtual_columns: VirtualColumnSet,
    workload: WorkloadTracker,
}

impl RowStore {
    /// Creates a new row store for the given table schema.
    pub fn new(schema: Table) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
            virtual_columns: VirtualColumnSet::new(),
            workload: WorkloadTracker::new(),
        }
    }

    /// Returns the table schema.
    pub fn schema(&self) -> &Table {
        &self.schema
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row_not_found(&self, row_id: RowId) -> Error {
        CoreError::not_found(self.schema.name(), Value::UInt64(row_id)).into()
    }

    /// Checks a row against the schema and validates its JSONB cells, then
    /// computes its virtual column values.
    fn prepare(&self, row: &Row) -> Result<Vec<Materialized>> {
        self.schema.check_row(row.values())?;
        for value in row.values() {
            if let Value::Jsonb(bytes) = value {
                validate(bytes.as_slice())?;
            }
        }
        self.virtual_columns.stage(row)
    }

    /// Inserts a row into the store.
    pub fn insert(&mut self, row: Row) -> Result<RowId> {
        let row_id = row.id();
        if self.rows.contains_key(&row_id) {
            return Err(CoreError::invalid_operation("Row ID already exists").into());
        }
        let staged = self.prepare(&row)?;

        self.virtual_columns.apply(row_id, staged);
        self.rows.insert(row_id, Arc::new(row));
        set_next_row_id_if_greater(row_id.saturating_add(1));
        Ok(row_id)
    }

    /// Replaces the values of a row, bumping its version.
    pub fn update(&mut self, row_id: RowId, values: Vec<Value>) -> Result<()> {
        let old_row = self
            .rows
            .get(&row_id)
            .ok_or_else(|| self.row_not_found(row_id))?;
        let new_row = Row::new_with_version(row_id, old_row.version() + 1, values);
        let staged = self.prepare(&new_row)?;

        self.virtual_columns.apply(row_id, staged);
        self.rows.insert(row_id, Arc::new(new_row));
        Ok(())
    }

    /// Deletes a row from the store.
    pub fn delete(&mut self, row_id: RowId) -> Result<Arc<Row>> {
        let row = self
            .rows
            .remove(&row_id)
            .ok_or_else(|| self.row_not_found(row_id))?;
        self.virtual_columns.forget(row_id);
        Ok(row)
    }

    /// Gets a row by ID.
    pub fn get(&self, row_id: RowId) -> Option<Arc<Row>> {
        self.rows.get(&row_id).cloned()
    }

    /// Returns an iterator over all rows in row ID order.
    pub fn scan(&self) -> impl Iterator<Item = Arc<Row>> + '_ {
        self.rows.values().cloned()
    }

    /// Returns all row IDs.
    pub fn row_ids(&self) -> Vec<RowId> {
        self.rows.keys().copied().collect()
    }

    /// Clears all rows and materialized values. Virtual columns stay registered.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.virtual_columns.clear();
    }

    /// Registers a virtual column, materializing it for every existing row.
    ///
    /// The column becomes visible only after the backfill succeeded.
    pub fn register_virtual_column(&mut self, descriptor: VirtualColumnDescriptor) -> Result<()> {
        if self.virtual_columns.contains(descriptor.name()) {
            return Err(Error::duplicate_virtual_column(descriptor.name()));
        }
        let source_index = self.jsonb_column_index(descriptor.source_column())?;

        let mut column = VirtualColumn::new(descriptor, source_index);
        column.backfill(self.rows.values().map(|row| row.as_ref()))?;
        debug!(
            table = self.schema.name(),
            column = column.name(),
            rows = self.rows.len(),
            non_null = column.non_null_count(),
            mismatches = column.mismatch_count(),
            "registered virtual column"
        );
        self.virtual_columns.install(column);
        Ok(())
    }

    fn jsonb_column_index(&self, name: &str) -> Result<usize> {
        let column = self
            .schema
            .get_column(name)
            .ok_or_else(|| CoreError::column_not_found(self.schema.name(), name))?;
        if !column.is_jsonb() {
            return Err(
                CoreError::type_mismatch(name, DataType::Jsonb, Some(column.data_type())).into(),
            );
        }
        Ok(column.index())
    }

    /// Removes a virtual column and its values.
    pub fn drop_virtual_column(&mut self, name: &str) -> Result<VirtualColumnDescriptor> {
        let column = self
            .virtual_columns
            .remove(name)
            .ok_or_else(|| Error::virtual_column_not_found(name))?;
        debug!(table = self.schema.name(), column = name, "dropped virtual column");
        Ok(column.descriptor().clone())
    }

    /// Returns the descriptors of all virtual columns in registration order.
    pub fn virtual_columns(&self) -> impl Iterator<Item = &VirtualColumnDescriptor> + '_ {
        self.virtual_columns.iter().map(|c| c.descriptor())
    }

    /// Gets a virtual column by name.
    pub fn virtual_column(&self, name: &str) -> Option<&VirtualColumn> {
        self.virtual_columns.get(name)
    }

    /// Returns the materialized value of virtual column `name` for a row.
    pub fn virtual_value(&self, name: &str, row_id: RowId) -> Result<Value> {
        let column = self
            .virtual_columns
            .get(name)
            .ok_or_else(|| Error::virtual_column_not_found(name))?;
        if !self.rows.contains_key(&row_id) {
            return Err(self.row_not_found(row_id));
        }
        Ok(column.value(row_id))
    }

    /// Returns the virtual column that can answer `access`, if any.
    pub fn rewrite(&self, access: &JsonAccess) -> Option<VirtualColumnRef> {
        self.virtual_columns.rewrite(access)
    }

    /// Evaluates `access` for one row, reading a virtual column when one
    /// substitutes for it.
    pub fn evaluate(&self, row_id: RowId, access: &JsonAccess) -> Result<Value> {
        let row = self
            .rows
            .get(&row_id)
            .ok_or_else(|| self.row_not_found(row_id))?;
        if let Some(vref) = self.rewrite(access) {
            return self.virtual_value(vref.name(), row_id);
        }
        let index = self
            .schema
            .get_column_index(access.column())
            .ok_or_else(|| CoreError::column_not_found(self.schema.name(), access.column()))?;
        access.evaluate(row.get(index).unwrap_or(&Value::Null))
    }

    /// Counts an access toward automatic materialization.
    pub fn record_access(&mut self, access: &JsonAccess) {
        self.workload.record(access);
    }

    /// Returns the recorded access counts.
    pub fn workload(&self) -> &WorkloadTracker {
        &self.workload
    }

    /// Registers virtual columns proposed by the recorded workload and by
    /// sampling stored documents, within the policy's column limit.
    ///
    /// Returns the names of the columns created.
    pub fn auto_materialize(&mut self, policy: &ExtractionPolicy) -> Result<Vec<String>> {
        let existing: Vec<VirtualColumnDescriptor> = self.virtual_columns().cloned().collect();
        let room = policy.max_columns().saturating_sub(existing.len());

        let mut proposed = self.workload.suggest(policy, &existing);
        proposed.extend(self.sample_candidates(policy)?);

        let mut created = Vec::new();
        for desc in proposed {
            if created.len() >= room {
                break;
            }
            let covered = self
                .virtual_columns
                .iter()
                .any(|c| c.descriptor().same_definition(&desc));
            if covered || self.virtual_columns.contains(desc.name()) {
                continue;
            }
            if self.jsonb_column_index(desc.source_column()).is_err() {
                debug!(column = desc.name(), "skipped proposal on non-jsonb column");
                continue;
            }
            let name = String::from(desc.name());
            self.register_virtual_column(desc)?;
            created.push(name);
        }
        debug!(
            table = self.schema.name(),
            created = created.len(),
            "auto materialization finished"
        );
        Ok(created)
    }

    /// Samples up to `sample_size` rows of every JSONB column.
    fn sample_candidates(&self, policy: &ExtractionPolicy) -> Result<Vec<VirtualColumnDescriptor>> {
        let mut found = Vec::new();
        if policy.sample_size() == 0 {
            return Ok(found);
        }
        for column in self.schema.columns().iter().filter(|c| c.is_jsonb()) {
            let mut stats = PathStatistics::new(policy.max_depth());
            for row in self.rows.values().take(policy.sample_size()) {
                if let Some(Value::Jsonb(bytes)) = row.get(column.index()) {
                    stats.observe_bytes(bytes.as_slice())?;
                }
            }
            debug!(
                column = column.name(),
                documents = stats.documents(),
                paths = stats.path_count(),
                "sampled json paths"
            );
            found.extend(
                stats
                    .candidates(policy.min_presence())
                    .into_iter()
                    .map(|(path, dt)| VirtualColumnDescriptor::new(column.name(), path, dt)),
            );
        }
        Ok(found)
    }

    /// Inserts one row per document in `text`, storing it in `column`.
    ///
    /// Every other column is set to NULL. Nothing is inserted unless every
    /// row is accepted.
    pub fn load_ndjson(
        &mut self,
        loader: &NdJsonLoader,
        text: &str,
        column: &str,
    ) -> Result<Vec<RowId>> {
        let index = self.jsonb_column_index(column)?;
        let width = self.schema.columns().len();

        let mut prepared = Vec::new();
        for doc in loader.load(text)?.into_iter().flatten() {
            let mut values = vec![Value::Null; width];
            if let Some(doc) = doc {
                values[index] = doc.into();
            }
            let row = Row::create(values);
            if self.rows.contains_key(&row.id()) {
                return Err(CoreError::invalid_operation("Row ID already exists").into());
            }
            let staged = self.prepare(&row)?;
            prepared.push((row, staged));
        }

        let mut ids = Vec::with_capacity(prepared.len());
        for (row, staged) in prepared {
            let row_id = row.id();
            self.virtual_columns.apply(row_id, staged);
            self.rows.insert(row_id, Arc::new(row));
            ids.push(row_id);
        }
        debug!(table = self.schema.name(), rows = ids.len(), "loaded ndjson");
        Ok(ids)
    }
}
