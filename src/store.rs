//src/store.rs
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

// Custom Error type for key-value store operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database connection failed")]
    Connection(#[from] rusqlite::Error),
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing database file")]
    Io(#[from] std::io::Error),
    #[error("Database query failed: {0}")]
    QueryFailed(rusqlite::Error),
    #[error("Database write failed: {0}")]
    WriteFailed(rusqlite::Error),
    #[error("Storage capacity exceeded writing '{key}' ({needed} bytes needed, {capacity} available)")]
    CapacityExceeded {
        key: String,
        needed: usize,
        capacity: usize,
    },
}

/// Flat string key-value storage, the local-storage analogue the tracker persists into.
///
/// `set` may fail with [`Error::CapacityExceeded`]; callers must treat that as a
/// persistence failure, not as a reason to discard in-memory state.
pub trait KeyValueStore {
    /// Returns the stored value for `key`, if any.
    /// # Errors
    /// Returns `Error` if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Stores `value` under `key`, overwriting any previous value.
    /// # Errors
    /// Returns `Error` if the write fails or the store is full.
    fn set(&mut self, key: &str, value: &str) -> Result<(), Error>;

    /// Deletes `key`. Removing a missing key is not an error.
    /// # Errors
    /// Returns `Error` if the backing storage cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), Error>;
}

/// In-memory store with an optional byte quota (keys + values), used by tests
/// and as a scratch store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    capacity: Option<usize>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects writes once keys + values would exceed `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity: Some(capacity),
        }
    }

    pub fn set_capacity(&mut self, capacity: Option<usize>) {
        self.capacity = capacity;
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        if let Some(capacity) = self.capacity {
            let needed = self.used_bytes_without(key) + key.len() + value.len();
            if needed > capacity {
                return Err(Error::CapacityExceeded {
                    key: key.to_string(),
                    needed,
                    capacity,
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), Error> {
        self.entries.remove(key);
        Ok(())
    }
}

const DB_FILE_NAME: &str = "tracker.sqlite";
const APP_DATA_DIR: &str = "gym-tracker"; // Same dir name as config

/// Gets the path to the SQLite database file within the app's data directory.
/// Exposed at crate root as get_db_path_util
pub fn get_db_path() -> Result<PathBuf, Error> {
    let data_dir = dirs::data_dir().ok_or(Error::DataDir)?;
    let app_dir = data_dir.join(APP_DATA_DIR);
    if !app_dir.exists() {
        std::fs::create_dir_all(&app_dir)?;
    }
    Ok(app_dir.join(DB_FILE_NAME))
}

/// SQLite-backed store: one `kv` table, one row per key.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (and initializes) the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let conn = Connection::open(path).map_err(Error::Connection)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory().map_err(Error::Connection)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }
}

/// Initializes the key-value table if it doesn't exist.
pub fn init_db(conn: &Connection) -> Result<(), Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL -- RFC3339, informational only
        )",
        [],
    )
    .map_err(Error::Connection)?;
    Ok(())
}

fn map_write_error(key: &str, value: &str, err: rusqlite::Error) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == rusqlite::ErrorCode::DiskFull => {
            Error::CapacityExceeded {
                key: key.to_string(),
                needed: key.len() + value.len(),
                capacity: 0,
            }
        }
        other => Error::WriteFailed(other),
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(Error::QueryFailed)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        debug!(key, bytes = value.len(), "writing store entry");
        self.conn
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, chrono::Utc::now().to_rfc3339()],
            )
            .map_err(|e| map_write_error(key, value, e))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), Error> {
        debug!(key, "removing store entry");
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(Error::WriteFailed)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_rejects_writes_over_capacity() {
        let mut store = MemoryStore::with_capacity(10);
        store.set("a", "1234").unwrap();
        let err = store.set("b", "123456789").unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded { .. }));
        // Overwriting an existing key only counts the new value.
        store.set("a", "12345678").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("12345678"));
        assert_eq!(store.get("b").unwrap(), None);
    }

    #[test]
    fn sqlite_store_overwrites_and_removes() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
