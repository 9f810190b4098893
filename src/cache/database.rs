//! SQLite-backed persistent metadata store.
//!
//! The store is a plain key/value table keyed by the raw bytes of the
//! absolute image path. It performs no validation of its own: rows are
//! fetched one path at a time and checked against the filesystem by
//! [`super::MetadataCache`] before they are served.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::entry::{nanos_to_system_time, system_time_to_nanos, CacheEntry, Fingerprint};
use super::error::{CacheError, CacheResult};

/// Layout version of the `entries` table. A mismatch rebuilds the table.
pub const SCHEMA_VERSION: &str = "2";

const ENTRY_COLUMNS: &str = "path, size_bytes, mtime_ns, width, height, format, color_type, \
     caption_text, caption_size, caption_mtime_ns, thumbnail, cached_at_ns, exif";

/// Persistent metadata store using SQLite.
pub struct CacheStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore").field("path", &self.path).finish()
    }
}

impl CacheStore {
    /// Opens or creates a store at the specified path.
    ///
    /// # Errors
    ///
    /// Fails if the parent directory cannot be created or the file is not a
    /// SQLite database.
    pub fn open(path: &Path) -> CacheResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.init_schema()?;

        log::debug!("Opened metadata cache at {}", path.display());
        Ok(store)
    }

    /// Opens a store that lives only as long as this value.
    ///
    /// # Errors
    ///
    /// Fails only if SQLite cannot allocate the database.
    pub fn in_memory() -> CacheResult<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Default platform-specific location of the store.
    ///
    /// - Linux: `~/.cache/capdeck/metadata.db`
    /// - macOS: `~/Library/Caches/com.capdeck.capdeck/metadata.db`
    /// - Windows: `%LOCALAPPDATA%\capdeck\capdeck\cache\metadata.db`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "capdeck", "capdeck")
            .map(|dirs| dirs.cache_dir().join("metadata.db"))
    }

    /// Location of the database file, `None` for in-memory stores.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init_schema(&self) -> CacheResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS meta (
                key     TEXT PRIMARY KEY,
                value   TEXT NOT NULL
            );",
        )?;

        let version: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        if version.as_deref() == Some(SCHEMA_VERSION) {
            return Ok(());
        }

        if let Some(old) = &version {
            log::info!(
                "Cache layout changed (v{} -> v{}), discarding cached entries",
                old,
                SCHEMA_VERSION
            );
        }

        self.conn.execute_batch(
            "DROP TABLE IF EXISTS entries;
             CREATE TABLE entries (
                path                BLOB PRIMARY KEY,
                size_bytes          INTEGER NOT NULL,
                mtime_ns            INTEGER NOT NULL,
                width               INTEGER NOT NULL,
                height              INTEGER NOT NULL,
                format              TEXT NOT NULL,
                color_type          TEXT NOT NULL,
                caption_text        TEXT NOT NULL,
                caption_size        INTEGER,
                caption_mtime_ns    INTEGER,
                thumbnail           BLOB NOT NULL,
                cached_at_ns        INTEGER NOT NULL,
                exif                TEXT NOT NULL
             );",
        )?;
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION],
        )?;
        Ok(())
    }

    /// Fetch the stored entry for `path`.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn get(&self, path: &Path) -> CacheResult<Option<CacheEntry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE path = ?1");
        let entry = self
            .conn
            .query_row(&sql, params![path_key(path)], row_to_entry)
            .optional()?;
        Ok(entry)
    }

    /// Paths of every stored entry, without loading the entries.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn paths(&self) -> CacheResult<Vec<PathBuf>> {
        let mut stmt = self.conn.prepare("SELECT path FROM entries ORDER BY path")?;
        let rows = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;

        let mut paths = Vec::new();
        for key in rows {
            paths.push(path_from_key(key?));
        }
        Ok(paths)
    }

    /// Start grouping writes into one transaction.
    ///
    /// Returns `false` without doing anything when a transaction is already
    /// open.
    ///
    /// # Errors
    ///
    /// Returns a database error if the transaction cannot be started.
    pub fn begin_batch(&self) -> CacheResult<bool> {
        if !self.conn.is_autocommit() {
            return Ok(false);
        }
        self.conn.execute_batch("BEGIN")?;
        Ok(true)
    }

    /// Commit the transaction opened by [`CacheStore::begin_batch`].
    ///
    /// A failed commit is rolled back so the connection returns to
    /// autocommit mode.
    ///
    /// # Errors
    ///
    /// Returns the error raised by the commit.
    pub fn commit_batch(&self) -> CacheResult<()> {
        if let Err(e) = self.conn.execute_batch("COMMIT") {
            if !self.conn.is_autocommit() {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    log::warn!("Failed to roll back cache writes: {}", rollback);
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Insert or replace the entry for `entry.path`.
    ///
    /// # Errors
    ///
    /// Returns a database error if the write fails (e.g. read-only file).
    pub fn upsert(&self, entry: &CacheEntry) -> CacheResult<()> {
        let (caption_size, caption_mtime) = stamp_columns(entry.caption_stamp.as_ref());
        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO entries ({ENTRY_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
            ),
            params![
                path_key(&entry.path),
                to_i64(entry.size_bytes),
                system_time_to_nanos(entry.mtime),
                i64::from(entry.width),
                i64::from(entry.height),
                entry.format,
                entry.color_type,
                entry.caption_text,
                caption_size,
                caption_mtime,
                entry.thumbnail_data,
                system_time_to_nanos(entry.cached_at),
                exif_column(&entry.exif),
            ],
        )?;
        Ok(())
    }

    /// Update only the caption columns of a stored entry.
    ///
    /// Returns whether a row was updated.
    ///
    /// # Errors
    ///
    /// Returns a database error if the write fails.
    pub fn update_caption(
        &self,
        path: &Path,
        text: &str,
        stamp: Option<&Fingerprint>,
    ) -> CacheResult<bool> {
        let (caption_size, caption_mtime) = stamp_columns(stamp);
        let changed = self.conn.execute(
            "UPDATE entries SET caption_text = ?1, caption_size = ?2, caption_mtime_ns = ?3
             WHERE path = ?4",
            params![text, caption_size, caption_mtime, path_key(path)],
        )?;
        Ok(changed > 0)
    }

    /// Remove the entry for `path`. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails.
    pub fn remove(&self, path: &Path) -> CacheResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM entries WHERE path = ?1", params![path_key(path)])?;
        Ok(removed > 0)
    }

    /// Remove every entry. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails.
    pub fn clear(&self) -> CacheResult<usize> {
        let removed = self.conn.execute("DELETE FROM entries", [])?;
        Ok(removed)
    }

    /// Number of stored entries.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn count(&self) -> CacheResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Close the connection, reporting any error SQLite raises on shutdown.
    ///
    /// # Errors
    ///
    /// Returns the error raised while closing.
    pub fn close(self) -> CacheResult<()> {
        self.conn.close().map_err(|(_, e)| CacheError::Database(e))
    }
}

fn path_key(path: &Path) -> &[u8] {
    path.as_os_str().as_encoded_bytes()
}

#[cfg(unix)]
fn path_from_key(key: Vec<u8>) -> PathBuf {
    use std::os::unix::ffi::OsStringExt;
    PathBuf::from(OsString::from_vec(key))
}

#[cfg(not(unix))]
fn path_from_key(key: Vec<u8>) -> PathBuf {
    // Keys were written from valid paths; only unpaired surrogates are lossy.
    PathBuf::from(OsString::from(String::from_utf8_lossy(&key).into_owned()))
}

fn exif_column(exif: &BTreeMap<String, String>) -> String {
    serde_json::to_string(exif).unwrap_or_else(|_| "{}".to_string())
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn stamp_columns(stamp: Option<&Fingerprint>) -> (Option<i64>, Option<i64>) {
    match stamp {
        Some(fp) => (Some(to_i64(fp.size)), Some(fp.mtime_nanos())),
        None => (None, None),
    }
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<CacheEntry> {
    let path: Vec<u8> = row.get(0)?;
    let size_bytes: i64 = row.get(1)?;
    let mtime_ns: i64 = row.get(2)?;
    let width: i64 = row.get(3)?;
    let height: i64 = row.get(4)?;
    let caption_size: Option<i64> = row.get(8)?;
    let caption_mtime_ns: Option<i64> = row.get(9)?;
    let cached_at_ns: i64 = row.get(11)?;
    let exif: String = row.get(12)?;

    let caption_stamp = match (caption_size, caption_mtime_ns) {
        (Some(size), Some(mtime)) => Some(Fingerprint::new(
            u64::try_from(size).unwrap_or(0),
            nanos_to_system_time(mtime),
        )),
        _ => None,
    };

    Ok(CacheEntry {
        path: path_from_key(path),
        size_bytes: u64::try_from(size_bytes).unwrap_or(0),
        mtime: nanos_to_system_time(mtime_ns),
        width: u32::try_from(width).unwrap_or(0),
        height: u32::try_from(height).unwrap_or(0),
        format: row.get(5)?,
        color_type: row.get(6)?,
        caption_text: row.get(7)?,
        caption_stamp,
        thumbnail_data: row.get(10)?,
        cached_at: nanos_to_system_time(cached_at_ns),
        exif: serde_json::from_str(&exif).unwrap_or_default(),
    })
}
