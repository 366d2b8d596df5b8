//! Core VFS types.
//!
//! [`Record`] is the single persisted entity: one row per cleaned path.
//! [`Metadata`] is the caller-facing view of a record.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::error::{VfsError, VfsResult};
use super::path;

/// File type mask for `mode`.
pub const S_IFMT: u32 = 0o170000;
/// Directory type bits.
pub const S_IFDIR: u32 = 0o040000;
/// Regular file type bits.
pub const S_IFREG: u32 = 0o100000;
/// Permission bits (including setuid/setgid/sticky).
pub const PERM_MASK: u32 = 0o7777;

/// Largest content a record may hold, matching SQLite's default
/// `SQLITE_MAX_LENGTH` for a single blob.
pub const MAX_FILE_SIZE: u64 = 1_000_000_000;

/// Default permissions for files created through `create`.
pub const DEFAULT_FILE_PERM: u32 = 0o666;
/// Default permissions for directories.
pub const DEFAULT_DIR_PERM: u32 = 0o777;

/// File type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl FileType {
    /// Derive the type from folded mode bits.
    pub fn from_mode(mode: u32) -> Self {
        if mode & S_IFMT == S_IFDIR {
            FileType::Directory
        } else {
            FileType::File
        }
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }
}

/// One persisted filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Cleaned path; the identity key.
    pub path: String,
    /// Permission bits folded with type bits.
    pub mode: u32,
    /// Last access time.
    pub atime: SystemTime,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Owner ID.
    pub uid: u32,
    /// Group ID.
    pub gid: u32,
    /// Content. Always empty for directories.
    pub data: Vec<u8>,
}

impl Record {
    /// A new empty regular file.
    pub fn file(path: impl Into<String>, perm: u32, now: SystemTime) -> Self {
        Self {
            path: path.into(),
            mode: S_IFREG | (perm & PERM_MASK),
            atime: now,
            mtime: now,
            uid: 0,
            gid: 0,
            data: Vec::new(),
        }
    }

    /// A new directory.
    pub fn directory(path: impl Into<String>, perm: u32, now: SystemTime) -> Self {
        Self {
            path: path.into(),
            mode: S_IFDIR | (perm & PERM_MASK),
            atime: now,
            mtime: now,
            uid: 0,
            gid: 0,
            data: Vec::new(),
        }
    }

    /// The implicit root. Never persisted.
    pub fn root() -> Self {
        Self::directory(path::ROOT, DEFAULT_DIR_PERM, UNIX_EPOCH)
    }

    pub fn kind(&self) -> FileType {
        FileType::from_mode(self.mode)
    }

    pub fn is_dir(&self) -> bool {
        self.kind().is_dir()
    }

    /// Reported size: content length for files, zero for directories.
    pub fn size(&self) -> u64 {
        if self.is_dir() {
            0
        } else {
            self.data.len() as u64
        }
    }
}

/// File metadata as reported by `stat` and `readdir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Last path segment (not the full path).
    pub name: String,
    /// Entry type.
    pub kind: FileType,
    /// Permission bits folded with type bits.
    pub mode: u32,
    /// Size in bytes (zero for directories).
    pub size: u64,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Last access time.
    pub atime: SystemTime,
    /// User ID.
    pub uid: u32,
    /// Group ID.
    pub gid: u32,
}

impl Metadata {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Permission bits without the type bits.
    pub fn perm(&self) -> u32 {
        self.mode & PERM_MASK
    }
}

impl From<&Record> for Metadata {
    fn from(record: &Record) -> Self {
        Self {
            name: path::base_name(&record.path).to_string(),
            kind: record.kind(),
            mode: record.mode,
            size: record.size(),
            mtime: record.mtime,
            atime: record.atime,
            uid: record.uid,
            gid: record.gid,
        }
    }
}

/// Open file flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags {
    /// Read access requested.
    pub read: bool,
    /// Write access requested.
    pub write: bool,
    /// Append mode: cursor writes always land at the current end.
    pub append: bool,
    /// Create if not exists.
    pub create: bool,
    /// Truncate on open.
    pub truncate: bool,
    /// Exclusive create (fail if exists).
    pub exclusive: bool,
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self {
            read: true,
            write: false,
            append: false,
            create: false,
            truncate: false,
            exclusive: false,
        }
    }
}

impl OpenFlags {
    /// Read-only access.
    pub fn read() -> Self {
        Self::default()
    }

    /// Write access (also enables read).
    pub fn write() -> Self {
        Self {
            read: true,
            write: true,
            ..Default::default()
        }
    }

    /// Create with write access.
    pub fn create() -> Self {
        Self {
            read: true,
            write: true,
            create: true,
            ..Default::default()
        }
    }

    /// Create exclusively (fail if exists).
    pub fn create_exclusive() -> Self {
        Self {
            exclusive: true,
            ..Self::create()
        }
    }

    /// Create and truncate.
    pub fn create_truncate() -> Self {
        Self {
            truncate: true,
            ..Self::create()
        }
    }

    /// Create if missing, write at the end.
    pub fn append() -> Self {
        Self {
            append: true,
            ..Self::create()
        }
    }

    /// Returns true if the handle must reject mutations.
    pub fn is_read_only(&self) -> bool {
        !self.write
    }
}

/// Timestamps are stored as signed nanoseconds relative to the Unix epoch.
///
/// Returns `None` outside the representable range (roughly 1677 to 2262)
/// so callers can refuse the time instead of storing a clamped one.
pub(crate) fn to_nanos(time: SystemTime) -> Option<i64> {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_nanos()).ok(),
        Err(e) => i64::try_from(e.duration().as_nanos())
            .ok()
            .and_then(i64::checked_neg),
    }
}

/// Reject times the store cannot keep exactly.
pub(crate) fn check_time(time: SystemTime) -> VfsResult<()> {
    match to_nanos(time) {
        Some(_) => Ok(()),
        None => Err(VfsError::invalid_operation(format!(
            "timestamp {time:?} is outside the storable range"
        ))),
    }
}

pub(crate) fn from_nanos(nanos: i64) -> SystemTime {
    if nanos >= 0 {
        UNIX_EPOCH + Duration::from_nanos(nanos as u64)
    } else {
        UNIX_EPOCH - Duration::from_nanos(nanos.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_mode() {
        assert!(FileType::from_mode(S_IFDIR | 0o755).is_dir());
        assert!(FileType::from_mode(S_IFREG | 0o644).is_file());
        // Bare permission bits are a regular file
        assert!(FileType::from_mode(0o644).is_file());
    }

    #[test]
    fn test_record_constructors() {
        let now = SystemTime::now();
        let file = Record::file("a/b.txt", 0o644, now);
        assert!(!file.is_dir());
        assert_eq!(file.mode, S_IFREG | 0o644);

        let dir = Record::directory("a", 0o40755, now);
        assert!(dir.is_dir());
        assert_eq!(dir.mode & PERM_MASK, 0o755);
    }

    #[test]
    fn test_directory_size_is_zero() {
        let mut dir = Record::directory("d", 0o755, SystemTime::now());
        dir.data = b"stray".to_vec();
        assert_eq!(dir.size(), 0);
    }

    #[test]
    fn test_metadata_uses_last_segment() {
        let record = Record::file("a/b/c.txt", 0o600, SystemTime::now());
        let meta = Metadata::from(&record);
        assert_eq!(meta.name, "c.txt");
        assert_eq!(meta.perm(), 0o600);
        assert!(meta.is_file());
    }

    #[test]
    fn test_open_flags() {
        let read = OpenFlags::read();
        assert!(read.read);
        assert!(read.is_read_only());

        let create = OpenFlags::create_exclusive();
        assert!(create.create);
        assert!(create.exclusive);
        assert!(create.write);

        let append = OpenFlags::append();
        assert!(append.append && append.create && !append.is_read_only());
    }

    #[test]
    fn test_nanos_conversion() {
        let t = UNIX_EPOCH + Duration::new(1_700_000_000, 123);
        assert_eq!(from_nanos(to_nanos(t).unwrap()), t);

        let before = UNIX_EPOCH - Duration::from_secs(10);
        assert_eq!(to_nanos(before), Some(-10_000_000_000));
        assert_eq!(from_nanos(-10_000_000_000), before);
    }

    #[test]
    fn test_out_of_range_times_are_rejected() {
        let far_future = UNIX_EPOCH + Duration::from_secs(400 * 365 * 86_400);
        assert_eq!(to_nanos(far_future), None);
        assert!(matches!(
            check_time(far_future),
            Err(VfsError::InvalidOperation(_))
        ));

        let far_past = UNIX_EPOCH - Duration::from_secs(400 * 365 * 86_400);
        assert_eq!(to_nanos(far_past), None);

        let near = UNIX_EPOCH + Duration::from_secs(200 * 365 * 86_400);
        assert!(check_time(near).is_ok());
    }
}
