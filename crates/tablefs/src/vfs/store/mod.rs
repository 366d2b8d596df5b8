//! Record stores.
//!
//! A [`RecordStore`] is a flat key-value table of [`Record`]s keyed by
//! cleaned path, plus prefix queries for subtree and child listing. The
//! directory tree is never materialized: [`PathStore`](crate::vfs::PathStore)
//! recomputes it from these queries on demand.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::fmt;

use super::error::VfsResult;
use super::path;
use super::types::Record;

/// Selection of records by position in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathQuery<'a> {
    /// The record at the path plus everything strictly under it.
    /// For the root this is every record.
    Subtree(&'a str),
    /// Records exactly one segment below the path.
    Children(&'a str),
}

impl PathQuery<'_> {
    /// Whether `key` is selected by this query.
    pub fn matches(&self, key: &str) -> bool {
        match *self {
            PathQuery::Subtree(root) => key == root || path::is_descendant(key, root),
            PathQuery::Children(dir) => path::is_child(key, dir),
        }
    }
}

/// Backing table of path-keyed records.
///
/// Implementations must be shareable across threads; a single instance is
/// injected once and reused by every handle.
pub trait RecordStore: Send + Sync + fmt::Debug {
    /// Fetch the record with exactly this key.
    fn find_one(&self, path: &str) -> VfsResult<Option<Record>>;

    /// Fetch every record selected by `query`, ordered by path.
    fn find(&self, query: PathQuery<'_>) -> VfsResult<Vec<Record>>;

    /// Insert a new record. Fails with `AlreadyExists` if the key is taken.
    fn insert(&self, record: &Record) -> VfsResult<()>;

    /// Insert or overwrite records.
    fn upsert(&self, records: &[Record]) -> VfsResult<()>;

    /// Delete records by key. Missing keys are ignored.
    fn delete(&self, paths: &[String]) -> VfsResult<()>;

    /// Whether `query` selects at least one record.
    fn any(&self, query: PathQuery<'_>) -> VfsResult<bool> {
        Ok(!self.find(query)?.is_empty())
    }

    /// Write `new`, then delete `old`.
    ///
    /// Stores without multi-row transactions must keep this order so an
    /// interrupted call leaves both copies rather than neither.
    fn replace(&self, new: &[Record], old: &[String]) -> VfsResult<()> {
        self.upsert(new)?;
        self.delete(old)
    }
}
