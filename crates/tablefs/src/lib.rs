//! # tablefs
//!
//! A hierarchical filesystem whose files and directories are rows of a
//! single table keyed by cleaned path.
//!
//! ```no_run
//! use std::path::Path;
//! use tablefs::{Fs, PathStore, TableFsConfig};
//!
//! let config = TableFsConfig::default();
//! let fs = PathStore::open(&config.database)?;
//! fs.mkdir_all(Path::new("notes/2024"), config.defaults.dir_perm)?;
//! fs.write_all(Path::new("notes/2024/todo.txt"), b"ship it")?;
//! # Ok::<(), tablefs::VfsError>(())
//! ```

pub mod config;
pub mod vfs;

pub use config::{ConfigError, DatabaseConfig, DefaultsConfig, JournalMode, TableFsConfig};
pub use vfs::{
    FileHandle, FileType, Fs, MemoryStore, Metadata, OpenFlags, PathQuery, PathStore, Record,
    RecordStore, SqliteStore, VfsError, VfsResult,
};
