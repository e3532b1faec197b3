//! Leaf-path statistics over sampled documents.
//!
//! Walks object keys of each sampled document and counts the kinds found at
//! every leaf path. Arrays are leaves. The statistics propose paths that are
//! present often enough and hold a single scalar kind, which makes them good
//! virtual column candidates.

use crate::error::Result;
use crate::navigator::JsonbRef;
use crate::path::{JsonPath, PathStep};
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use vellum_core::DataType;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct LeafCounts {
    nulls: usize,
    booleans: usize,
    integers: usize,
    floats: usize,
    strings: usize,
    containers: usize,
}

impl LeafCounts {
    fn non_null(&self) -> usize {
        self.booleans + self.integers + self.floats + self.strings + self.containers
    }

    /// The single scalar type every non-null occurrence fits, if any.
    fn uniform_type(&self) -> Option<DataType> {
        let n = self.non_null();
        if n == 0 || self.containers > 0 {
            None
        } else if self.booleans == n {
            Some(DataType::Boolean)
        } else if self.strings == n {
            Some(DataType::String)
        } else if self.integers == n {
            Some(DataType::Int64)
        } else if self.integers + self.floats == n {
            Some(DataType::Float64)
        } else {
            None
        }
    }
}

/// Per-path kind counts collected from sampled documents.
#[derive(Clone, Debug)]
pub struct PathStatistics {
    max_depth: usize,
    documents: usize,
    leaves: BTreeMap<JsonPath, LeafCounts>,
}

impl PathStatistics {
    /// Creates empty statistics that follow object keys at most `max_depth` levels deep.
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            documents: 0,
            leaves: BTreeMap::new(),
        }
    }

    /// Returns the number of documents observed.
    #[inline]
    pub fn documents(&self) -> usize {
        self.documents
    }

    /// Returns the number of distinct leaf paths seen.
    #[inline]
    pub fn path_count(&self) -> usize {
        self.leaves.len()
    }

    /// Records one encoded document.
    pub fn observe_bytes(&mut self, buf: &[u8]) -> Result<()> {
        self.observe(JsonbRef::from_slice(buf)?)
    }

    /// Records one document.
    pub fn observe(&mut self, doc: JsonbRef<'_>) -> Result<()> {
        self.documents += 1;
        let mut path = Vec::new();
        self.walk(doc, &mut path)
    }

    fn walk(&mut self, value: JsonbRef<'_>, path: &mut Vec<PathStep>) -> Result<()> {
        match value {
            JsonbRef::Object(c) if path.len() < self.max_depth => {
                for pair in c.object_iter() {
                    let (key, child) = pair?;
                    path.push(PathStep::Key(key.into()));
                    self.walk(child, path)?;
                    path.pop();
                }
            }
            _ if !path.is_empty() => {
                let counts = self
                    .leaves
                    .entry(JsonPath::new(path.clone()))
                    .or_default();
                match value {
                    JsonbRef::Null => counts.nulls += 1,
                    JsonbRef::Bool(_) => counts.booleans += 1,
                    JsonbRef::Number(n) => match n.as_i128() {
                        Some(i) if i64::try_from(i).is_ok() => counts.integers += 1,
                        _ => counts.floats += 1,
                    },
                    JsonbRef::String(_) => counts.strings += 1,
                    JsonbRef::Array(_) | JsonbRef::Object(_) => counts.containers += 1,
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Returns the share of observed documents with a non-null value at `path`.
    pub fn presence(&self, path: &JsonPath) -> f64 {
        match self.leaves.get(path) {
            Some(counts) if self.documents > 0 => {
                counts.non_null() as f64 / self.documents as f64
            }
            _ => 0.0,
        }
    }

    /// Returns paths present in at least `min_presence` of the documents whose
    /// values share one scalar type, most frequent first.
    pub fn candidates(&self, min_presence: f64) -> Vec<(JsonPath, DataType)> {
        let mut found: Vec<(usize, &JsonPath, DataType)> = self
            .leaves
            .iter()
            .filter(|(path, _)| self.presence(path) >= min_presence)
            .filter_map(|(path, counts)| {
                counts
                    .uniform_type()
                    .map(|dt| (counts.non_null(), path, dt))
            })
            .collect();
        found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        found
            .into_iter()
            .map(|(_, path, dt)| (path.clone(), dt))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::JsonbBinary;
    use alloc::vec;

    fn observe_all(stats: &mut PathStatistics, docs: &[&str]) {
        for doc in docs {
            let binary = JsonbBinary::parse(doc).unwrap();
            stats.observe_bytes(binary.as_bytes()).unwrap();
        }
    }

    fn path(text: &str) -> JsonPath {
        JsonPath::parse(text).unwrap()
    }

    #[test]
    fn test_candidates_by_kind() {
        let mut stats = PathStatistics::new(4);
        observe_all(
            &mut stats,
            &[
                r#"{"id":1,"score":1.5,"repo":{"name":"a"},"tags":["x"],"ok":true}"#,
                r#"{"id":2,"score":2,"repo":{"name":"b"},"tags":[],"ok":false}"#,
                r#"{"id":3,"score":3,"repo":{"name":null},"ok":true,"mixed":1}"#,
                r#"{"id":4,"repo":{},"mixed":"1"}"#,
            ],
        );
        assert_eq!(stats.documents(), 4);

        let candidates = stats.candidates(0.5);
        assert_eq!(
            candidates,
            vec![
                (path(":id"), DataType::Int64),
                (path(":ok"), DataType::Boolean),
                (path(":score"), DataType::Float64),
                (path(":repo.name"), DataType::String),
            ]
        );
        assert!(!candidates.iter().any(|(p, _)| p == &path(":tags")));
    }

    #[test]
    fn test_presence() {
        let mut stats = PathStatistics::new(4);
        observe_all(&mut stats, &[r#"{"a":1}"#, r#"{"a":null}"#, r#"{"b":1}"#, "[1]"]);
        assert_eq!(stats.presence(&path(":a")), 0.25);
        assert_eq!(stats.presence(&path(":zzz")), 0.0);
        assert!(stats.candidates(0.3).is_empty());
    }

    #[test]
    fn test_max_depth_makes_objects_leaves() {
        let mut stats = PathStatistics::new(1);
        observe_all(&mut stats, &[r#"{"a":{"b":1},"c":2}"#]);
        assert_eq!(stats.path_count(), 2);
        assert_eq!(stats.candidates(0.0), vec![(path(":c"), DataType::Int64)]);
    }

    #[test]
    fn test_huge_integers_are_floats() {
        let mut stats = PathStatistics::new(2);
        observe_all(&mut stats, &[r#"{"n":1}"#, r#"{"n":18446744073709551615}"#]);
        assert_eq!(stats.candidates(1.0), vec![(path(":n"), DataType::Float64)]);
    }
}
