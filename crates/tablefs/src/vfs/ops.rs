//! Filesystem operations trait.
//!
//! This is the caller-facing contract: path-based metadata and namespace
//! operations, with content I/O going through a [`FileHandle`] returned by
//! `open`/`open_file`/`create`.

use std::path::Path;
use std::time::SystemTime;

use super::VfsResult;
use super::handle::FileHandle;
use super::types::{DEFAULT_FILE_PERM, Metadata, OpenFlags};

/// Core filesystem operations.
///
/// All paths are cleaned before lookup, so `/a/b`, `a//b/` and `a/./b`
/// name the same entry. `.` and `/` both name the root.
pub trait Fs: Send + Sync {
    /// Name of this filesystem implementation.
    fn name(&self) -> &'static str;

    // ========================================================================
    // Reading
    // ========================================================================

    /// Get file metadata.
    fn stat(&self, path: &Path) -> VfsResult<Metadata>;

    /// List the immediate children of a directory, sorted by name.
    ///
    /// `count <= 0` returns every entry; a positive count returns at most
    /// that many. Use [`FileHandle::readdir`] to continue a listing.
    fn readdir(&self, path: &Path, count: i64) -> VfsResult<Vec<Metadata>>;

    /// Open for reading.
    fn open(&self, path: &Path) -> VfsResult<FileHandle>;

    /// Open with explicit flags, creating with `perm` when requested.
    fn open_file(&self, path: &Path, flags: OpenFlags, perm: u32) -> VfsResult<FileHandle>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Create a new empty file and open it read-write.
    ///
    /// Fails with `AlreadyExists` if anything is at `path`.
    fn create(&self, path: &Path) -> VfsResult<FileHandle>;

    /// Create a directory. The parent must exist.
    fn mkdir(&self, path: &Path, perm: u32) -> VfsResult<()>;

    /// Create a directory and any missing ancestors.
    fn mkdir_all(&self, path: &Path, perm: u32) -> VfsResult<()>;

    /// Remove a file or an empty directory.
    fn remove(&self, path: &Path) -> VfsResult<()>;

    /// Remove a path and everything under it. Missing paths are not an error.
    fn remove_all(&self, path: &Path) -> VfsResult<()>;

    /// Move a file or directory (with its whole subtree).
    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()>;

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Change permission bits. The file type is always preserved.
    fn chmod(&self, path: &Path, mode: u32) -> VfsResult<()>;

    /// Change owner and group.
    fn chown(&self, path: &Path, uid: u32, gid: u32) -> VfsResult<()>;

    /// Set access and modification times.
    fn chtimes(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> VfsResult<()>;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> VfsResult<bool> {
        match self.stat(path) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Read entire file contents.
    fn read_all(&self, path: &Path) -> VfsResult<Vec<u8>> {
        self.open(path)?.read_all()
    }

    /// Write entire file contents, creating or truncating as needed.
    fn write_all(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        let mut handle = self.open_file(path, OpenFlags::create_truncate(), DEFAULT_FILE_PERM)?;
        handle.write(data)?;
        Ok(())
    }
}
