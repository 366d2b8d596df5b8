//! Per-open file cursor.
//!
//! A [`FileHandle`] holds no content. Every read re-fetches the record and
//! every write re-saves it, so a write is durable and visible to other
//! handles as soon as the call returns. The flip side is that each call
//! moves the whole blob to and from the store; large files pay for that on
//! every operation.

use std::io::{self, SeekFrom};

use super::error::{VfsError, VfsResult};
use super::fs::{PathStore, tagged};
use super::types::{MAX_FILE_SIZE, Metadata, OpenFlags, Record};

/// Cursor over one record of a [`PathStore`].
///
/// Handles on the same path are independent: each keeps its own cursor and
/// sees the others' writes only through the store.
#[derive(Debug)]
pub struct FileHandle {
    fs: PathStore,
    path: String,
    flags: OpenFlags,
    cursor: u64,
    /// Entries already returned by `readdir` with a positive count.
    dir_offset: usize,
}

impl FileHandle {
    pub(crate) fn new(fs: PathStore, path: String, flags: OpenFlags) -> Self {
        Self {
            fs,
            path,
            flags,
            cursor: 0,
            dir_offset: 0,
        }
    }

    /// The cleaned path this handle is bound to.
    pub fn name(&self) -> &str {
        &self.path
    }

    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    /// Current cursor position.
    pub fn position(&self) -> u64 {
        self.cursor
    }

    fn check_writable(&self) -> VfsResult<()> {
        if self.flags.is_read_only() {
            return Err(VfsError::read_only(self.path.clone()));
        }
        Ok(())
    }

    /// Fetch the bound record, rejecting directories for content access.
    fn fetch_content(&self, op: &'static str) -> VfsResult<Record> {
        let record = self.fs.fetch(&self.path).map_err(|e| e.during(op))?;
        if record.is_dir() {
            return Err(VfsError::invalid_operation(format!(
                "{op} on directory {}",
                self.path
            )));
        }
        Ok(record)
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// Read from the cursor, advancing it by the number of bytes copied.
    ///
    /// Returns `EndOfStream` when the cursor is at or past the end.
    pub fn read(&mut self, buf: &mut [u8]) -> VfsResult<usize> {
        let record = self.fetch_content("read")?;
        if buf.is_empty() {
            return Ok(0);
        }
        let start = match usize::try_from(self.cursor) {
            Ok(start) if start < record.data.len() => start,
            _ => return Err(VfsError::EndOfStream),
        };

        let n = copy_from(&record.data, start, buf);
        self.cursor += n as u64;
        Ok(n)
    }

    /// Read at `offset` without moving the cursor.
    ///
    /// An offset exactly at the end yields `EndOfStream`; one beyond it
    /// yields `UnexpectedEndOfStream`.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> VfsResult<usize> {
        let record = self.fetch_content("read_at")?;
        let len = record.data.len() as u64;
        if offset == len {
            return Err(VfsError::EndOfStream);
        }
        if offset > len {
            return Err(VfsError::UnexpectedEndOfStream);
        }

        Ok(copy_from(&record.data, offset as usize, buf))
    }

    /// Read everything from the cursor to the end and move the cursor there.
    pub fn read_all(&mut self) -> VfsResult<Vec<u8>> {
        let record = self.fetch_content("read")?;
        let start = usize::try_from(self.cursor)
            .unwrap_or(usize::MAX)
            .min(record.data.len());
        let rest = record.data[start..].to_vec();
        self.cursor = self.cursor.max(record.data.len() as u64);
        Ok(rest)
    }

    // ========================================================================
    // Writing
    // ========================================================================

    /// Copy `buf` into the record at `offset` (or at the end when `None`),
    /// zero-filling any gap, and persist. Returns the end of the written
    /// range.
    fn splice(&self, op: &'static str, buf: &[u8], offset: Option<u64>) -> VfsResult<u64> {
        tagged(op, || {
            self.check_writable()?;
            let mut record = self.fetch_content(op)?;

            let start = offset.unwrap_or(record.data.len() as u64);
            if buf.is_empty() {
                return Ok(start);
            }
            let end = start
                .checked_add(buf.len() as u64)
                .filter(|end| *end <= MAX_FILE_SIZE)
                .ok_or_else(|| {
                    VfsError::invalid_operation(format!(
                        "{op} of {} bytes at {start} exceeds the {MAX_FILE_SIZE} byte limit",
                        buf.len()
                    ))
                })?;
            // Both fit in usize once under the cap.
            let (lo, hi) = (start as usize, end as usize);

            if record.data.len() < hi {
                record.data.resize(hi, 0);
            }
            record.data[lo..hi].copy_from_slice(buf);
            record.mtime = self.fs.now();
            self.fs.save(&record)?;

            tracing::trace!(path = %self.path, start, end, "wrote");
            Ok(end)
        })
    }

    /// Write at the cursor (or at the end in append mode) and advance it.
    pub fn write(&mut self, buf: &[u8]) -> VfsResult<usize> {
        let offset = if self.flags.append {
            None
        } else {
            Some(self.cursor)
        };
        self.cursor = self.splice("write", buf, offset)?;
        Ok(buf.len())
    }

    /// Write at `offset` without moving the cursor.
    pub fn write_at(&self, buf: &[u8], offset: u64) -> VfsResult<usize> {
        if self.flags.append {
            return Err(VfsError::invalid_operation(format!(
                "write_at on append-mode handle {}",
                self.path
            )));
        }
        self.splice("write_at", buf, Some(offset))?;
        Ok(buf.len())
    }

    /// Write UTF-8 text at the cursor.
    pub fn write_str(&mut self, s: &str) -> VfsResult<usize> {
        self.write(s.as_bytes())
    }

    /// Shrink or zero-extend the content to exactly `size` bytes.
    ///
    /// Shrinking discards bytes; extending again yields zeros, not the old
    /// content.
    pub fn truncate(&self, size: u64) -> VfsResult<()> {
        tagged("truncate", || {
            self.check_writable()?;
            if size > MAX_FILE_SIZE {
                return Err(VfsError::invalid_operation(format!(
                    "truncate to {size} bytes exceeds the {MAX_FILE_SIZE} byte limit"
                )));
            }
            let mut record = self.fetch_content("truncate")?;
            let size = size as usize;

            if record.data.len() == size {
                return Ok(());
            }
            record.data.resize(size, 0);
            record.mtime = self.fs.now();
            self.fs.save(&record)
        })
    }

    // ========================================================================
    // Cursor and metadata
    // ========================================================================

    /// Move the cursor. Seeking from the end re-reads the current size.
    ///
    /// Never touches the record; seeking past the end is allowed.
    pub fn seek(&mut self, pos: SeekFrom) -> VfsResult<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.cursor.checked_add_signed(delta),
            SeekFrom::End(delta) => self.stat()?.size.checked_add_signed(delta),
        };
        self.cursor = target.ok_or_else(|| {
            VfsError::invalid_operation(format!("seek to invalid position in {}", self.path))
        })?;
        Ok(self.cursor)
    }

    /// Metadata of the bound record.
    pub fn stat(&self) -> VfsResult<Metadata> {
        let record = self.fs.fetch(&self.path).map_err(|e| e.during("stat"))?;
        Ok(Metadata::from(&record))
    }

    /// Nothing is buffered, so there is nothing to flush.
    pub fn sync(&self) -> VfsResult<()> {
        Ok(())
    }

    /// Release the handle. Every write has already been persisted.
    pub fn close(self) -> VfsResult<()> {
        Ok(())
    }

    // ========================================================================
    // Directory listing
    // ========================================================================

    /// List directory entries, continuing where the previous call stopped.
    ///
    /// With `count <= 0` returns everything not yet returned. With a
    /// positive count returns at most `count` entries, and `EndOfStream`
    /// once the listing is exhausted. The listing is recomputed on every
    /// call, so concurrent changes to the directory can shift entries.
    pub fn readdir(&mut self, count: i64) -> VfsResult<Vec<Metadata>> {
        let entries = self
            .fs
            .list_children(&self.path)
            .map_err(|e| e.during("readdir"))?;
        let start = self.dir_offset.min(entries.len());
        let rest = &entries[start..];

        if count <= 0 {
            self.dir_offset = entries.len();
            return Ok(rest.to_vec());
        }
        if rest.is_empty() {
            return Err(VfsError::EndOfStream);
        }

        let take = usize::try_from(count).unwrap_or(usize::MAX).min(rest.len());
        self.dir_offset = start + take;
        Ok(rest[..take].to_vec())
    }

    /// Like [`readdir`](Self::readdir) but returns only names.
    pub fn readdir_names(&mut self, count: i64) -> VfsResult<Vec<String>> {
        Ok(self
            .readdir(count)?
            .into_iter()
            .map(|entry| entry.name)
            .collect())
    }
}

fn copy_from(data: &[u8], start: usize, buf: &mut [u8]) -> usize {
    let n = buf.len().min(data.len() - start);
    buf[..n].copy_from_slice(&data[start..start + n]);
    n
}

impl io::Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match FileHandle::read(self, buf) {
            Ok(n) => Ok(n),
            Err(VfsError::EndOfStream) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl io::Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        FileHandle::write(self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Seek for FileHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        FileHandle::seek(self, pos).map_err(Into::into)
    }
}
