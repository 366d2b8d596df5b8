//! In-memory record store.
//!
//! Used for testing and scratch filesystems. All data is ephemeral.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;

use super::{PathQuery, RecordStore};
use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::path;
use crate::vfs::types::Record;

/// In-memory record table.
///
/// Thread-safe via internal `RwLock`. Keys are kept ordered so subtree
/// queries are range scans.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, Record>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted records (the root is never counted).
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn collect(records: &BTreeMap<String, Record>, query: PathQuery<'_>) -> Vec<Record> {
        let dir = match query {
            PathQuery::Subtree(dir) | PathQuery::Children(dir) => dir,
        };

        let Some(prefix) = path::subtree_prefix(dir) else {
            return records
                .values()
                .filter(|r| query.matches(&r.path))
                .cloned()
                .collect();
        };

        let mut result = Vec::new();
        if let PathQuery::Subtree(root) = query
            && let Some(record) = records.get(root)
        {
            result.push(record.clone());
        }
        let range = records.range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded));
        for (key, record) in range {
            if !key.starts_with(&prefix) {
                break;
            }
            if query.matches(key) {
                result.push(record.clone());
            }
        }
        result
    }
}

impl RecordStore for MemoryStore {
    fn find_one(&self, path: &str) -> VfsResult<Option<Record>> {
        Ok(self.records.read().get(path).cloned())
    }

    fn find(&self, query: PathQuery<'_>) -> VfsResult<Vec<Record>> {
        let records = self.records.read();
        let mut result = Self::collect(&records, query);
        result.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(result)
    }

    fn insert(&self, record: &Record) -> VfsResult<()> {
        let mut records = self.records.write();
        if records.contains_key(&record.path) {
            return Err(VfsError::already_exists(record.path.clone()));
        }
        records.insert(record.path.clone(), record.clone());
        Ok(())
    }

    fn upsert(&self, batch: &[Record]) -> VfsResult<()> {
        let mut records = self.records.write();
        for record in batch {
            records.insert(record.path.clone(), record.clone());
        }
        Ok(())
    }

    fn delete(&self, paths: &[String]) -> VfsResult<()> {
        let mut records = self.records.write();
        for key in paths {
            records.remove(key);
        }
        Ok(())
    }

    fn replace(&self, new: &[Record], old: &[String]) -> VfsResult<()> {
        // One write lock covers both halves.
        let mut records = self.records.write();
        for record in new {
            records.insert(record.path.clone(), record.clone());
        }
        for key in old {
            records.remove(key);
        }
        Ok(())
    }
}
