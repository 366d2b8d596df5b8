//! Hierarchical filesystem over a flat record table.
//!
//! Key components:
//!
//! - [`Fs`] - Core trait for filesystem operations
//! - [`PathStore`] - `Fs` implementation over a [`RecordStore`]
//! - [`FileHandle`] - Per-open cursor for content I/O and directory listing
//! - [`SqliteStore`] - Records as rows of one SQLite table
//! - [`MemoryStore`] - In-memory records (for scratch use, testing)
//!
//! ## Design Decisions
//!
//! - **Keys, not inodes**: every entry is identified by its cleaned,
//!   root-relative path. The root (`"."`) is implicit and never stored.
//! - **Segment-anchored prefixes**: `foo` owns `foo/bar` but not `foobar`.
//! - **Whole-record round trips**: each handle call fetches and persists
//!   the full record, so there is nothing to flush.

mod clock;
mod error;
mod fs;
mod handle;
mod ops;
pub mod path;
pub mod store;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{StoreSource, VfsError, VfsResult};
pub use fs::PathStore;
pub use handle::FileHandle;
pub use ops::Fs;
pub use store::{MemoryStore, PathQuery, RecordStore, SqliteStore};
pub use types::{
    DEFAULT_DIR_PERM, DEFAULT_FILE_PERM, FileType, MAX_FILE_SIZE, Metadata, OpenFlags, PERM_MASK,
    Record, S_IFDIR, S_IFMT, S_IFREG,
};
