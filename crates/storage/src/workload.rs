//! Access counting and the policy deciding which paths to materialize.

use crate::rewrite::JsonAccess;
use crate::virtual_column::VirtualColumnDescriptor;
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;
use vellum_core::DataType;
use vellum_jsonb::JsonPath;

/// Thresholds for automatic virtual column creation.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractionPolicy {
    min_hits: usize,
    max_columns: usize,
    min_presence: f64,
    max_depth: usize,
    sample_size: usize,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            min_hits: 3,
            max_columns: 16,
            min_presence: 0.5,
            max_depth: 4,
            sample_size: 1000,
        }
    }
}

impl ExtractionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accesses a path needs before the workload proposes it.
    pub fn with_min_hits(mut self, min_hits: usize) -> Self {
        self.min_hits = min_hits;
        self
    }

    /// Upper bound on virtual columns per table, existing ones included.
    pub fn with_max_columns(mut self, max_columns: usize) -> Self {
        self.max_columns = max_columns;
        self
    }

    /// Share of sampled documents a path must be non-null in.
    pub fn with_min_presence(mut self, min_presence: f64) -> Self {
        self.min_presence = min_presence;
        self
    }

    /// Deepest object nesting sampled.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Number of rows sampled for path statistics. Zero disables sampling.
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    #[inline]
    pub fn min_hits(&self) -> usize {
        self.min_hits
    }

    #[inline]
    pub fn max_columns(&self) -> usize {
        self.max_columns
    }

    #[inline]
    pub fn min_presence(&self) -> f64 {
        self.min_presence
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }
}

type AccessKey = (String, JsonPath, DataType);

fn access_key(access: &JsonAccess) -> AccessKey {
    (
        String::from(access.column()),
        access.path().clone(),
        access.target(),
    )
}

/// Counts JSON accesses per column, path and target type.
#[derive(Clone, Debug, Default)]
pub struct WorkloadTracker {
    hits: HashMap<AccessKey, usize>,
}

impl WorkloadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one evaluation of `access`. The cast mode is not part of the key.
    pub fn record(&mut self, access: &JsonAccess) {
        *self.hits.entry(access_key(access)).or_insert(0) += 1;
    }

    /// Returns how often `access` was recorded.
    pub fn hits(&self, access: &JsonAccess) -> usize {
        self.hits.get(&access_key(access)).copied().unwrap_or(0)
    }

    /// Number of distinct accesses recorded.
    #[inline]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn clear(&mut self) {
        self.hits.clear();
    }

    /// Proposes descriptors for the hottest accesses not yet materialized.
    ///
    /// Only accesses with at least `min_hits` hits qualify, and no more are
    /// returned than `max_columns` leaves room for next to `existing`.
    pub fn suggest(
        &self,
        policy: &ExtractionPolicy,
        existing: &[VirtualColumnDescriptor],
    ) -> Vec<VirtualColumnDescriptor> {
        let room = policy.max_columns().saturating_sub(existing.len());
        let mut hot: Vec<(&AccessKey, usize)> = self
            .hits
            .iter()
            .filter(|&(_, &n)| n >= policy.min_hits())
            .filter(|&((column, path, target), _)| {
                !existing.iter().any(|d| {
                    d.source_column() == column.as_str()
                        && d.path() == path
                        && d.data_type() == *target
                })
            })
            .map(|(key, &n)| (key, n))
            .collect();
        hot.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| a.0 .0.cmp(&b.0 .0))
                .then_with(|| a.0 .1.cmp(&b.0 .1))
                .then_with(|| a.0 .2.name().cmp(b.0 .2.name()))
        });
        hot.into_iter()
            .take(room)
            .map(|((column, path, target), _)| {
                VirtualColumnDescriptor::new(column.as_str(), path.clone(), *target)
            })
            .collect()
    }
}
