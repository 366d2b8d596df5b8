//! VFS error types.

use std::error::Error as StdError;
use std::io;
use thiserror::Error;

/// Boxed error raised by a [`RecordStore`](super::store::RecordStore) backend.
pub type StoreSource = Box<dyn StdError + Send + Sync + 'static>;

/// VFS error type.
#[derive(Debug, Error)]
pub enum VfsError {
    /// Path, or the parent directory of a path, does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Path already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Mutation attempted through a read-only handle.
    #[error("file handle is read only: {0}")]
    ReadOnly(String),

    /// Read exactly at the end of the content.
    #[error("end of stream")]
    EndOfStream,

    /// Read offset lies beyond the end of the content.
    #[error("unexpected end of stream")]
    UnexpectedEndOfStream,

    /// Operation does not apply to this entry (e.g. reading a directory).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Expected a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Directory not empty.
    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    /// Invalid path.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The backing record store failed.
    #[error("store failure during {op}: {source}")]
    Store {
        op: &'static str,
        #[source]
        source: StoreSource,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl VfsError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an AlreadyExists error.
    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists(path.into())
    }

    /// Create a ReadOnly error.
    pub fn read_only(path: impl Into<String>) -> Self {
        Self::ReadOnly(path.into())
    }

    /// Create an InvalidOperation error.
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Create a DirectoryNotEmpty error.
    pub fn directory_not_empty(path: impl Into<String>) -> Self {
        Self::DirectoryNotEmpty(path.into())
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Wrap a backend failure, tagged with the store operation that raised it.
    pub fn store(op: &'static str, source: impl Into<StoreSource>) -> Self {
        Self::Store {
            op,
            source: source.into(),
        }
    }

    /// Attribute a store failure to the filesystem operation that issued it.
    ///
    /// Other kinds pass through unchanged.
    pub fn during(self, op: &'static str) -> Self {
        match self {
            Self::Store { source, .. } => Self::Store { op, source },
            other => other,
        }
    }

    /// Returns true for [`VfsError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true for [`VfsError::AlreadyExists`].
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

/// Convert VfsError to std::io::Error for compatibility.
impl From<VfsError> for io::Error {
    fn from(e: VfsError) -> Self {
        match e {
            VfsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            VfsError::AlreadyExists(msg) => io::Error::new(io::ErrorKind::AlreadyExists, msg),
            VfsError::ReadOnly(msg) => io::Error::new(io::ErrorKind::PermissionDenied, msg),
            VfsError::EndOfStream => io::Error::new(io::ErrorKind::UnexpectedEof, "end of stream"),
            VfsError::UnexpectedEndOfStream => {
                io::Error::new(io::ErrorKind::UnexpectedEof, "unexpected end of stream")
            }
            VfsError::InvalidOperation(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            VfsError::NotADirectory(msg) => io::Error::new(io::ErrorKind::NotADirectory, msg),
            VfsError::DirectoryNotEmpty(msg) => {
                io::Error::new(io::ErrorKind::DirectoryNotEmpty, msg)
            }
            VfsError::InvalidPath(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            e @ VfsError::Store { .. } => io::Error::other(e),
            VfsError::Io(e) => e,
        }
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;
