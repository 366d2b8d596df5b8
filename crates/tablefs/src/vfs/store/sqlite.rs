//! SQLite record store.
//!
//! The whole filesystem is one table, `files`, keyed by cleaned path.
//! Subtree and child queries compare a `dir/` prefix with `substr` instead
//! of `LIKE`, so `%` and `_` in names need no escaping and matches are
//! always anchored on a segment boundary.

use parking_lot::Mutex;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use std::path::Path;
use std::time::{Duration, SystemTime};

use super::{PathQuery, RecordStore};
use crate::config::{DatabaseConfig, JournalMode};
use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::path;
use crate::vfs::types::{Record, from_nanos, to_nanos};

const SCHEMA: &str = r#"
-- One row per file or directory; the root is implicit
CREATE TABLE IF NOT EXISTS files (
    path TEXT PRIMARY KEY,
    mode INTEGER NOT NULL,
    atime INTEGER NOT NULL,
    mtime INTEGER NOT NULL,
    uid INTEGER NOT NULL DEFAULT 0,
    gid INTEGER NOT NULL DEFAULT 0,
    data BLOB NOT NULL DEFAULT x''
);
"#;

const COLUMNS: &str = "path, mode, atime, mtime, uid, gid, data";

/// Nanosecond column value, refusing times that would not round-trip.
fn encode_time(time: SystemTime) -> rusqlite::Result<i64> {
    to_nanos(time).ok_or_else(|| {
        rusqlite::Error::ToSqlConversionFailure(
            format!("timestamp {time:?} is outside the storable range").into(),
        )
    })
}

/// SQLite-backed record table.
///
/// The connection sits behind a mutex so one store can be shared by every
/// handle on every thread. Each call holds the lock for its own statements
/// only.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> VfsResult<Self> {
        let conn = Connection::open(path).map_err(|e| VfsError::store("open", e))?;
        Self::from_connection(conn)
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> VfsResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| VfsError::store("open", e))?;
        Self::from_connection(conn)
    }

    /// Open the database described by `config`, applying its pragmas.
    pub fn with_config(config: &DatabaseConfig) -> VfsResult<Self> {
        let conn = if config.is_in_memory() {
            Connection::open_in_memory()
        } else {
            Connection::open(&config.path)
        }
        .map_err(|e| VfsError::store("open", e))?;

        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(|e| VfsError::store("busy_timeout", e))?;
        if config.journal_mode != JournalMode::Default {
            let mode: String = conn
                .pragma_update_and_check(
                    None,
                    "journal_mode",
                    config.journal_mode.to_string(),
                    |row| row.get(0),
                )
                .map_err(|e| VfsError::store("journal_mode", e))?;
            tracing::debug!(requested = %config.journal_mode, actual = %mode, "set journal mode");
        }

        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> VfsResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| VfsError::store("ensure_schema", e))?;
        tracing::info!("tablefs schema ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<Record> {
        Ok(Record {
            path: row.get(0)?,
            mode: row.get(1)?,
            atime: from_nanos(row.get(2)?),
            mtime: from_nanos(row.get(3)?),
            uid: row.get(4)?,
            gid: row.get(5)?,
            data: row.get(6)?,
        })
    }

    fn upsert_in(conn: &Connection, record: &Record) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO files (path, mode, atime, mtime, uid, gid, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.path,
                record.mode,
                encode_time(record.atime)?,
                encode_time(record.mtime)?,
                record.uid,
                record.gid,
                record.data,
            ],
        )?;
        Ok(())
    }

    fn delete_in(conn: &Connection, key: &str) -> rusqlite::Result<()> {
        conn.execute("DELETE FROM files WHERE path = ?1", params![key])?;
        Ok(())
    }

    /// SQL filter plus its bound parameters for a query.
    ///
    /// `?1` is the key itself and `?2` the `dir/` prefix. The root has no
    /// prefix, so its filters only reference `?1`; every parameter must
    /// appear in the filter or binding fails.
    fn filter(query: PathQuery<'_>) -> (&'static str, String, Option<String>) {
        match query {
            PathQuery::Subtree(dir) => match path::subtree_prefix(dir) {
                Some(prefix) => (
                    "path = ?1 OR substr(path, 1, length(?2)) = ?2",
                    dir.to_string(),
                    Some(prefix),
                ),
                None => ("path != ?1", dir.to_string(), None),
            },
            PathQuery::Children(dir) => match path::subtree_prefix(dir) {
                Some(prefix) => (
                    "substr(path, 1, length(?2)) = ?2 \
                     AND instr(substr(path, length(?2) + 1), '/') = 0 \
                     AND path != ?1",
                    dir.to_string(),
                    Some(prefix),
                ),
                None => ("instr(path, '/') = 0 AND path != ?1", dir.to_string(), None),
            },
        }
    }
}

impl RecordStore for SqliteStore {
    fn find_one(&self, key: &str) -> VfsResult<Option<Record>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM files WHERE path = ?1"),
            params![key],
            Self::row_to_record,
        )
        .optional()
        .map_err(|e| VfsError::store("find_one", e))
    }

    fn find(&self, query: PathQuery<'_>) -> VfsResult<Vec<Record>> {
        let (filter, key, prefix) = Self::filter(query);
        let sql = format!("SELECT {COLUMNS} FROM files WHERE {filter} ORDER BY path");

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| VfsError::store("find", e))?;
        let rows = match prefix {
            Some(prefix) => stmt.query_map(params![key, prefix], Self::row_to_record),
            None => stmt.query_map(params![key], Self::row_to_record),
        }
        .map_err(|e| VfsError::store("find", e))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| VfsError::store("find", e))
    }

    fn any(&self, query: PathQuery<'_>) -> VfsResult<bool> {
        let (filter, key, prefix) = Self::filter(query);
        let sql = format!("SELECT EXISTS(SELECT 1 FROM files WHERE {filter})");

        let conn = self.conn.lock();
        let exists: rusqlite::Result<bool> = match prefix {
            Some(prefix) => conn.query_row(&sql, params![key, prefix], |row| row.get(0)),
            None => conn.query_row(&sql, params![key], |row| row.get(0)),
        };
        exists.map_err(|e| VfsError::store("any", e))
    }

    fn insert(&self, record: &Record) -> VfsResult<()> {
        let atime = encode_time(record.atime).map_err(|e| VfsError::store("insert", e))?;
        let mtime = encode_time(record.mtime).map_err(|e| VfsError::store("insert", e))?;

        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO files (path, mode, atime, mtime, uid, gid, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.path,
                record.mode,
                atime,
                mtime,
                record.uid,
                record.gid,
                record.data,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(VfsError::already_exists(record.path.clone()))
            }
            Err(e) => Err(VfsError::store("insert", e)),
        }
    }

    fn upsert(&self, records: &[Record]) -> VfsResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| VfsError::store("upsert", e))?;
        for record in records {
            Self::upsert_in(&tx, record).map_err(|e| VfsError::store("upsert", e))?;
        }
        tx.commit().map_err(|e| VfsError::store("upsert", e))
    }

    fn delete(&self, paths: &[String]) -> VfsResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| VfsError::store("delete", e))?;
        for key in paths {
            Self::delete_in(&tx, key).map_err(|e| VfsError::store("delete", e))?;
        }
        tx.commit().map_err(|e| VfsError::store("delete", e))
    }

    fn replace(&self, new: &[Record], old: &[String]) -> VfsResult<()> {
        // Use a transaction for atomicity; new rows still go in first.
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| VfsError::store("replace", e))?;
        for record in new {
            Self::upsert_in(&tx, record).map_err(|e| VfsError::store("replace", e))?;
        }
        for key in old {
            Self::delete_in(&tx, key).map_err(|e| VfsError::store("replace", e))?;
        }
        tx.commit().map_err(|e| VfsError::store("replace", e))
    }
}
