//! Path-keyed filesystem over a [`RecordStore`].
//!
//! The hierarchy is never materialized. A directory's contents are the
//! records whose keys extend its own by exactly one segment, and moving or
//! deleting a subtree is a prefix query followed by a batch write.

use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use super::clock::{Clock, SystemClock};
use super::error::{VfsError, VfsResult};
use super::handle::FileHandle;
use super::ops::Fs;
use super::path;
use super::store::{MemoryStore, PathQuery, RecordStore, SqliteStore};
use super::types::{
    DEFAULT_FILE_PERM, Metadata, OpenFlags, PERM_MASK, Record, S_IFMT, check_time,
};
use crate::config::DatabaseConfig;

/// Filesystem whose entries are rows of a shared [`RecordStore`].
///
/// Cloning is cheap and every clone (and every handle opened from one)
/// sees the same store.
#[derive(Debug, Clone)]
pub struct PathStore {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl PathStore {
    /// Wrap a store, stamping records with the system clock.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Scratch filesystem backed by a [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Open the SQLite database described by `config`.
    pub fn open(config: &DatabaseConfig) -> VfsResult<Self> {
        Ok(Self::new(Arc::new(SqliteStore::with_config(config)?)))
    }

    /// The underlying record store.
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Whether the parent of `path` exists and is a directory.
    pub fn has_parent(&self, path: &Path) -> VfsResult<bool> {
        let key = path::clean(path)?;
        if path::is_root(&key) {
            return Ok(true);
        }
        Ok(self
            .lookup(path::parent(&key))?
            .is_some_and(|record| record.is_dir()))
    }

    // ========================================================================
    // Record helpers shared with FileHandle
    // ========================================================================

    pub(crate) fn now(&self) -> SystemTime {
        self.clock.now()
    }

    /// Record at `key`, synthesizing the root.
    pub(crate) fn lookup(&self, key: &str) -> VfsResult<Option<Record>> {
        if path::is_root(key) {
            return Ok(Some(Record::root()));
        }
        self.store.find_one(key)
    }

    pub(crate) fn fetch(&self, key: &str) -> VfsResult<Record> {
        self.lookup(key)?
            .ok_or_else(|| VfsError::not_found(key.to_string()))
    }

    /// Like `fetch`, but for operations that must write the record back.
    fn fetch_stored(&self, key: &str, op: &str) -> VfsResult<Record> {
        if path::is_root(key) {
            return Err(VfsError::invalid_operation(format!("{op} on root")));
        }
        self.fetch(key)
    }

    pub(crate) fn save(&self, record: &Record) -> VfsResult<()> {
        self.store.upsert(std::slice::from_ref(record))
    }

    /// The parent of `key` must be an existing directory.
    fn ensure_parent(&self, key: &str) -> VfsResult<()> {
        let parent = path::parent(key);
        match self.lookup(parent)? {
            Some(record) if record.is_dir() => Ok(()),
            Some(_) => Err(VfsError::not_a_directory(parent.to_string())),
            None => Err(VfsError::not_found(parent.to_string())),
        }
    }

    /// Immediate children of the directory at `key`, sorted by name.
    pub(crate) fn list_children(&self, key: &str) -> VfsResult<Vec<Metadata>> {
        if !self.fetch(key)?.is_dir() {
            return Err(VfsError::not_a_directory(key.to_string()));
        }
        let mut entries: Vec<Metadata> = self
            .store
            .find(PathQuery::Children(key))?
            .iter()
            .map(Metadata::from)
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn insert_file(&self, key: &str, perm: u32) -> VfsResult<()> {
        self.ensure_parent(key)?;
        let record = Record::file(key, perm, self.now());
        self.store.insert(&record)?;
        tracing::debug!(path = %key, mode = format_args!("{:o}", record.mode), "created file");
        Ok(())
    }

    /// Read-modify-write of one stored record.
    fn update(
        &self,
        path: &Path,
        op: &'static str,
        f: impl FnOnce(&mut Record),
    ) -> VfsResult<()> {
        tagged(op, || {
            let key = path::clean(path)?;
            let mut record = self.fetch_stored(&key, op)?;
            f(&mut record);
            self.save(&record)?;
            tracing::debug!(path = %key, op, "updated metadata");
            Ok(())
        })
    }
}

/// Run `body`, attributing any store failure to the filesystem operation `op`.
pub(crate) fn tagged<T>(op: &'static str, body: impl FnOnce() -> VfsResult<T>) -> VfsResult<T> {
    body().map_err(|e| e.during(op))
}

impl Fs for PathStore {
    fn name(&self) -> &'static str {
        "tablefs"
    }

    fn stat(&self, path: &Path) -> VfsResult<Metadata> {
        tagged("stat", || {
            let key = path::clean(path)?;
            Ok(Metadata::from(&self.fetch(&key)?))
        })
    }

    fn readdir(&self, path: &Path, count: i64) -> VfsResult<Vec<Metadata>> {
        tagged("readdir", || {
            let key = path::clean(path)?;
            let mut entries = self.list_children(&key)?;
            if let Ok(limit) = usize::try_from(count)
                && limit > 0
            {
                entries.truncate(limit);
            }
            Ok(entries)
        })
    }

    fn open(&self, path: &Path) -> VfsResult<FileHandle> {
        tagged("open", || self.open_file(path, OpenFlags::read(), 0))
    }

    fn open_file(&self, path: &Path, flags: OpenFlags, perm: u32) -> VfsResult<FileHandle> {
        tagged("open_file", || {
            let key = path::clean(path)?;

            match self.lookup(&key)? {
                Some(_) if flags.create && flags.exclusive => {
                    return Err(VfsError::already_exists(key));
                }
                Some(mut record) => {
                    if flags.truncate && flags.write && !record.is_dir() && !record.data.is_empty()
                    {
                        record.data.clear();
                        record.mtime = self.now();
                        self.save(&record)?;
                        tracing::debug!(path = %key, "truncated on open");
                    }
                }
                None if flags.create => match self.insert_file(&key, perm) {
                    // Lost a race with another creator; open what they made.
                    Err(e) if e.is_already_exists() && !flags.exclusive => {}
                    other => other?,
                },
                None => return Err(VfsError::not_found(key)),
            }

            Ok(FileHandle::new(self.clone(), key, flags))
        })
    }

    fn create(&self, path: &Path) -> VfsResult<FileHandle> {
        tagged("create", || {
            self.open_file(path, OpenFlags::create_exclusive(), DEFAULT_FILE_PERM)
        })
    }

    fn mkdir(&self, path: &Path, perm: u32) -> VfsResult<()> {
        tagged("mkdir", || {
            let key = path::clean(path)?;
            if path::is_root(&key) {
                return Err(VfsError::already_exists(key));
            }
            self.ensure_parent(&key)?;
            self.store
                .insert(&Record::directory(key.as_str(), perm, self.now()))?;
            tracing::debug!(path = %key, perm = format_args!("{perm:o}"), "created directory");
            Ok(())
        })
    }

    fn mkdir_all(&self, path: &Path, perm: u32) -> VfsResult<()> {
        tagged("mkdir_all", || {
            let key = path::clean(path)?;
            for segment in path::ancestors(&key) {
                match self.store.find_one(segment)? {
                    Some(record) if record.is_dir() => continue,
                    Some(_) => return Err(VfsError::not_a_directory(segment.to_string())),
                    None => {}
                }
                match self.mkdir(Path::new(segment), perm) {
                    Err(e) if e.is_already_exists() => {}
                    other => other?,
                }
            }
            Ok(())
        })
    }

    fn remove(&self, path: &Path) -> VfsResult<()> {
        tagged("remove", || {
            let key = path::clean(path)?;
            let record = self.fetch_stored(&key, "remove")?;
            if record.is_dir() && self.store.any(PathQuery::Children(&key))? {
                return Err(VfsError::directory_not_empty(key));
            }
            self.store.delete(&[key.clone()])?;
            tracing::debug!(path = %key, "removed");
            Ok(())
        })
    }

    #[tracing::instrument(skip(self))]
    fn remove_all(&self, path: &Path) -> VfsResult<()> {
        tagged("remove_all", || {
            let key = path::clean(path)?;
            let doomed: Vec<String> = self
                .store
                .find(PathQuery::Subtree(&key))?
                .into_iter()
                .map(|record| record.path)
                .collect();
            if doomed.is_empty() {
                return Ok(());
            }
            self.store.delete(&doomed)?;
            tracing::debug!(path = %key, count = doomed.len(), "removed subtree");
            Ok(())
        })
    }

    #[tracing::instrument(skip(self))]
    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        tagged("rename", || {
            let old = path::clean(from)?;
            let new = path::clean(to)?;
            if path::is_root(&old) || path::is_root(&new) {
                return Err(VfsError::invalid_operation("cannot rename the root"));
            }

            let source = self.fetch(&old)?;
            if old == new {
                return Ok(());
            }
            if path::is_descendant(&new, &old) {
                return Err(VfsError::invalid_operation(format!(
                    "cannot move {old} into its own subtree {new}"
                )));
            }
            self.ensure_parent(&new)?;
            if let Some(target) = self.store.find_one(&new)? {
                if source.is_dir() || target.is_dir() {
                    return Err(VfsError::already_exists(new));
                }
                tracing::debug!(from = %old, to = %new, "replacing existing file");
            }

            let now = self.now();
            let moved = self.store.find(PathQuery::Subtree(&old))?;
            let mut rewritten = Vec::with_capacity(moved.len());
            let mut originals = Vec::with_capacity(moved.len());
            for mut record in moved {
                let key = std::mem::take(&mut record.path);
                record.path = path::rebase(&key, &old, &new);
                record.mtime = now;
                rewritten.push(record);
                originals.push(key);
            }
            if rewritten.is_empty() {
                tracing::warn!(from = %old, "source vanished before rename");
                return Err(VfsError::not_found(old));
            }

            self.store.replace(&rewritten, &originals)?;
            tracing::debug!(from = %old, to = %new, count = rewritten.len(), "renamed");
            Ok(())
        })
    }

    fn chmod(&self, path: &Path, mode: u32) -> VfsResult<()> {
        let now = self.now();
        self.update(path, "chmod", |record| {
            record.mode = (record.mode & S_IFMT) | (mode & PERM_MASK);
            record.mtime = now;
        })
    }

    fn chown(&self, path: &Path, uid: u32, gid: u32) -> VfsResult<()> {
        let now = self.now();
        self.update(path, "chown", |record| {
            record.uid = uid;
            record.gid = gid;
            record.mtime = now;
        })
    }

    fn chtimes(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> VfsResult<()> {
        check_time(atime)?;
        check_time(mtime)?;
        self.update(path, "chtimes", |record| {
            record.atime = atime;
            record.mtime = mtime;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::clock::ManualClock;
    use crate::vfs::types::{S_IFDIR, S_IFREG};
    use std::time::{Duration, UNIX_EPOCH};

    fn fs() -> PathStore {
        PathStore::in_memory()
    }

    fn clocked() -> (PathStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(UNIX_EPOCH + Duration::from_secs(1_000)));
        let fs = PathStore::with_clock(Arc::new(MemoryStore::new()), clock.clone());
        (fs, clock)
    }

    fn p(s: &str) -> &Path {
        Path::new(s)
    }

    #[test]
    fn test_name() {
        assert_eq!(fs().name(), "tablefs");
    }

    #[test]
    fn test_root_is_synthesized() {
        let fs = fs();
        let root = fs.stat(p("/")).unwrap();
        assert!(root.is_dir());
        assert_eq!(fs.stat(p(".")).unwrap(), root);
        assert!(fs.exists(p("")).unwrap());
        assert!(fs.readdir(p("/"), 0).unwrap().is_empty());
    }

    #[test]
    fn test_paths_are_cleaned() {
        let fs = fs();
        fs.mkdir(p("/a"), 0o755).unwrap();
        fs.create(p("a//b.txt")).unwrap();
        assert!(fs.exists(p("/a/./b.txt")).unwrap());
        assert!(fs.exists(p("a/c/../b.txt")).unwrap());
    }

    #[test]
    fn test_create_requires_parent() {
        let fs = fs();
        let err = fs.create(p("missing/file")).unwrap_err();
        assert!(err.is_not_found());

        fs.create(p("plain")).unwrap();
        let err = fs.create(p("plain/child")).unwrap_err();
        assert!(matches!(err, VfsError::NotADirectory(_)));
    }

    #[test]
    fn test_create_existing_fails() {
        let fs = fs();
        fs.create(p("a")).unwrap();
        assert!(fs.create(p("a")).unwrap_err().is_already_exists());
    }

    #[test]
    fn test_create_sets_mode_and_times() {
        let (fs, clock) = clocked();
        fs.create(p("f")).unwrap();
        let meta = fs.stat(p("f")).unwrap();
        assert_eq!(meta.mode, S_IFREG | DEFAULT_FILE_PERM);
        assert_eq!(meta.size, 0);
        assert_eq!(meta.mtime, clock.now());
        assert_eq!(meta.atime, clock.now());
    }

    #[test]
    fn test_open_missing_without_create() {
        let fs = fs();
        assert!(fs.open(p("nope")).unwrap_err().is_not_found());
        assert!(fs
            .open_file(p("nope"), OpenFlags::write(), 0o644)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_open_file_create_perm() {
        let fs = fs();
        fs.open_file(p("x"), OpenFlags::create(), 0o600).unwrap();
        assert_eq!(fs.stat(p("x")).unwrap().perm(), 0o600);

        // Non-exclusive create on an existing file just opens it.
        fs.open_file(p("x"), OpenFlags::create(), 0o644).unwrap();
        assert_eq!(fs.stat(p("x")).unwrap().perm(), 0o600);

        assert!(fs
            .open_file(p("x"), OpenFlags::create_exclusive(), 0o644)
            .unwrap_err()
            .is_already_exists());
    }

    #[test]
    fn test_open_truncate() {
        let fs = fs();
        fs.write_all(p("t"), b"long content").unwrap();
        fs.write_all(p("t"), b"short").unwrap();
        assert_eq!(fs.read_all(p("t")).unwrap(), b"short");
    }

    #[test]
    fn test_mkdir() {
        let fs = fs();
        fs.mkdir(p("d"), 0o750).unwrap();
        let meta = fs.stat(p("d")).unwrap();
        assert!(meta.is_dir());
        assert_eq!(meta.mode, S_IFDIR | 0o750);
        assert_eq!(meta.size, 0);

        assert!(fs.mkdir(p("d"), 0o750).unwrap_err().is_already_exists());
        assert!(fs.mkdir(p("/"), 0o750).unwrap_err().is_already_exists());
        assert!(fs.mkdir(p("x/y"), 0o750).unwrap_err().is_not_found());
    }

    #[test]
    fn test_mkdir_all() {
        let fs = fs();
        fs.mkdir_all(p("a/b/c"), 0o755).unwrap();
        fs.mkdir_all(p("a/b/c"), 0o755).unwrap();
        for d in ["a", "a/b", "a/b/c"] {
            assert!(fs.stat(p(d)).unwrap().is_dir());
        }

        fs.create(p("a/file")).unwrap();
        let err = fs.mkdir_all(p("a/file/sub"), 0o755).unwrap_err();
        assert!(matches!(err, VfsError::NotADirectory(_)));
    }

    #[test]
    fn test_remove() {
        let fs = fs();
        fs.mkdir(p("d"), 0o755).unwrap();
        fs.create(p("d/f")).unwrap();

        assert!(matches!(
            fs.remove(p("d")).unwrap_err(),
            VfsError::DirectoryNotEmpty(_)
        ));
        fs.remove(p("d/f")).unwrap();
        fs.remove(p("d")).unwrap();
        assert!(!fs.exists(p("d")).unwrap());

        assert!(fs.remove(p("d")).unwrap_err().is_not_found());
        assert!(matches!(
            fs.remove(p("/")).unwrap_err(),
            VfsError::InvalidOperation(_)
        ));
    }

    #[test]
    fn test_remove_all_is_segment_anchored() {
        let fs = fs();
        fs.mkdir_all(p("foo/a"), 0o755).unwrap();
        fs.create(p("foo/a/f")).unwrap();
        fs.create(p("foobar")).unwrap();

        fs.remove_all(p("foo")).unwrap();
        assert!(!fs.exists(p("foo")).unwrap());
        assert!(!fs.exists(p("foo/a/f")).unwrap());
        assert!(fs.exists(p("foobar")).unwrap());

        fs.remove_all(p("never/there")).unwrap();
    }

    #[test]
    fn test_rename_file() {
        let (fs, clock) = clocked();
        fs.write_all(p("a"), b"payload").unwrap();
        clock.advance(Duration::from_secs(5));

        fs.rename(p("a"), p("b")).unwrap();
        assert!(!fs.exists(p("a")).unwrap());
        assert_eq!(fs.read_all(p("b")).unwrap(), b"payload");
        assert_eq!(fs.stat(p("b")).unwrap().mtime, clock.now());
    }

    #[test]
    fn test_rename_overwrites_file_but_not_directory() {
        let fs = fs();
        fs.write_all(p("a"), b"new").unwrap();
        fs.write_all(p("b"), b"old").unwrap();
        fs.rename(p("a"), p("b")).unwrap();
        assert_eq!(fs.read_all(p("b")).unwrap(), b"new");

        fs.mkdir(p("d"), 0o755).unwrap();
        assert!(fs.rename(p("b"), p("d")).unwrap_err().is_already_exists());
        assert!(fs.rename(p("d"), p("b")).unwrap_err().is_already_exists());
    }

    #[test]
    fn test_rename_rejections() {
        let fs = fs();
        fs.mkdir_all(p("d/e"), 0o755).unwrap();

        assert!(fs.rename(p("nope"), p("x")).unwrap_err().is_not_found());
        assert!(fs.rename(p("d"), p("missing/d")).unwrap_err().is_not_found());
        assert!(matches!(
            fs.rename(p("d"), p("d/e/d")).unwrap_err(),
            VfsError::InvalidOperation(_)
        ));
        assert!(matches!(
            fs.rename(p("/"), p("x")).unwrap_err(),
            VfsError::InvalidOperation(_)
        ));
        fs.rename(p("d"), p("./d/")).unwrap();
        assert!(fs.exists(p("d/e")).unwrap());
    }

    #[test]
    fn test_chmod_preserves_type() {
        let fs = fs();
        fs.mkdir(p("d"), 0o755).unwrap();
        fs.chmod(p("d"), S_IFREG | 0o700).unwrap();
        let meta = fs.stat(p("d")).unwrap();
        assert!(meta.is_dir());
        assert_eq!(meta.mode, S_IFDIR | 0o700);

        assert!(fs.chmod(p("gone"), 0o644).unwrap_err().is_not_found());
    }

    #[test]
    fn test_chown_and_chtimes() {
        let (fs, clock) = clocked();
        fs.create(p("f")).unwrap();

        clock.advance(Duration::from_secs(60));
        fs.chown(p("f"), 1000, 100).unwrap();
        let meta = fs.stat(p("f")).unwrap();
        assert_eq!((meta.uid, meta.gid), (1000, 100));
        assert_eq!(meta.mtime, clock.now());

        let atime = UNIX_EPOCH + Duration::from_secs(42);
        let mtime = UNIX_EPOCH + Duration::from_secs(43);
        fs.chtimes(p("f"), atime, mtime).unwrap();
        let meta = fs.stat(p("f")).unwrap();
        assert_eq!(meta.atime, atime);
        assert_eq!(meta.mtime, mtime);
    }

    #[test]
    fn test_readdir_sorted_and_limited() {
        let fs = fs();
        fs.mkdir(p("d"), 0o755).unwrap();
        for name in ["c", "a", "b"] {
            fs.create(&p("d").join(name)).unwrap();
        }
        fs.mkdir(p("d/sub"), 0o755).unwrap();
        fs.create(p("d/sub/deep")).unwrap();

        let names: Vec<String> = fs
            .readdir(p("d"), -1)
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c", "sub"]);
        assert_eq!(fs.readdir(p("d"), 2).unwrap().len(), 2);

        assert!(matches!(
            fs.readdir(p("d/a"), 0).unwrap_err(),
            VfsError::NotADirectory(_)
        ));
    }

    #[test]
    fn test_has_parent() {
        let fs = fs();
        fs.mkdir(p("d"), 0o755).unwrap();
        fs.create(p("f")).unwrap();
        assert!(fs.has_parent(p("d/x")).unwrap());
        assert!(fs.has_parent(p("top")).unwrap());
        assert!(!fs.has_parent(p("f/x")).unwrap());
        assert!(!fs.has_parent(p("nope/x")).unwrap());
    }

    #[test]
    fn test_clones_share_store() {
        let fs = fs();
        let other = fs.clone();
        fs.write_all(p("shared"), b"1").unwrap();
        assert_eq!(other.read_all(p("shared")).unwrap(), b"1");
    }

    /// Serves reads from memory and fails every write.
    #[derive(Debug, Default)]
    struct FullDisk {
        inner: MemoryStore,
    }

    impl RecordStore for FullDisk {
        fn find_one(&self, path: &str) -> VfsResult<Option<Record>> {
            self.inner.find_one(path)
        }

        fn find(&self, query: PathQuery<'_>) -> VfsResult<Vec<Record>> {
            self.inner.find(query)
        }

        fn insert(&self, _record: &Record) -> VfsResult<()> {
            Err(VfsError::store("insert", "disk full"))
        }

        fn upsert(&self, _records: &[Record]) -> VfsResult<()> {
            Err(VfsError::store("upsert", "disk full"))
        }

        fn delete(&self, _paths: &[String]) -> VfsResult<()> {
            Err(VfsError::store("delete", "disk full"))
        }
    }

    fn failed_op(err: VfsError) -> &'static str {
        match err {
            VfsError::Store { op, .. } => op,
            other => panic!("expected a store failure, got {other:?}"),
        }
    }

    #[test]
    fn test_store_failures_name_the_filesystem_operation() {
        let disk = FullDisk::default();
        let now = SystemTime::now();
        disk.inner.insert(&Record::directory("d", 0o755, now)).unwrap();
        disk.inner.insert(&Record::file("d/f", 0o644, now)).unwrap();
        let fs = PathStore::new(Arc::new(disk));

        assert_eq!(failed_op(fs.chmod(p("d/f"), 0o600).unwrap_err()), "chmod");
        assert_eq!(failed_op(fs.chown(p("d/f"), 1, 1).unwrap_err()), "chown");
        assert_eq!(failed_op(fs.rename(p("d"), p("e")).unwrap_err()), "rename");
        assert_eq!(failed_op(fs.remove(p("d/f")).unwrap_err()), "remove");
        assert_eq!(failed_op(fs.remove_all(p("d")).unwrap_err()), "remove_all");
        assert_eq!(failed_op(fs.mkdir(p("d/sub"), 0o755).unwrap_err()), "mkdir");
        assert_eq!(failed_op(fs.mkdir_all(p("x/y"), 0o755).unwrap_err()), "mkdir_all");
        assert_eq!(failed_op(fs.create(p("d/new")).unwrap_err()), "create");

        let mut f = fs.open_file(p("d/f"), OpenFlags::write(), 0).unwrap();
        assert_eq!(failed_op(f.write(b"x").unwrap_err()), "write");
        assert_eq!(failed_op(f.write_at(b"x", 3).unwrap_err()), "write_at");
        assert_eq!(failed_op(f.truncate(9).unwrap_err()), "truncate");
    }

    #[test]
    fn test_chtimes_rejects_unstorable_times() {
        let fs = fs();
        fs.create(p("t")).unwrap();
        let before = fs.stat(p("t")).unwrap();

        let far = UNIX_EPOCH + Duration::from_secs(400 * 365 * 86_400);
        assert!(matches!(
            fs.chtimes(p("t"), far, far).unwrap_err(),
            VfsError::InvalidOperation(_)
        ));
        assert_eq!(fs.stat(p("t")).unwrap(), before);
    }
}
