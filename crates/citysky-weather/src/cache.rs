//! Key-value cache for weather snapshots, notes and the city list.
//!
//! Values are stored as JSON text. Reads never fail: a missing, unreadable
//! or malformed entry is reported as absent.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use citysky_core::StorageError;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::Coordinates;

/// A stored value plus its write time.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    pub value: String,
    pub stored_at: DateTime<Utc>,
}

/// String-keyed persistent store with synchronous semantics.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StorageError>;
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// SQLite-backed store. One `kv` table; last writer wins.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::OpenFailed(format!("{}: {}", parent.display(), e)))?;
        }
        let conn =
            Connection::open(path).map_err(|e| StorageError::OpenFailed(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        tracing::debug!("Opened cache at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StorageError::OpenFailed(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        self.conn
            .lock()
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    stored_at INTEGER NOT NULL
                );
                "#,
            )
            .map_err(|e| StorageError::OpenFailed(e.to_string()))
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StorageError> {
        let row: Option<(String, i64)> = self
            .conn
            .lock()
            .query_row(
                "SELECT value, stored_at FROM kv WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(row.map(|(value, stored_ms)| StoredValue {
            value,
            stored_at: Utc
                .timestamp_millis_opt(stored_ms)
                .single()
                .unwrap_or_else(Utc::now),
        }))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let now = Utc::now().timestamp_millis();
        self.conn
            .lock()
            .execute(
                "INSERT OR REPLACE INTO kv (key, value, stored_at) VALUES (?1, ?2, ?3)",
                params![key, value, now],
            )
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .lock()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        Ok(())
    }
}

/// Process-local store; nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, StoredValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                stored_at: Utc::now(),
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Cache keys. `Display` renders the stored key string.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheKey {
    /// `weather-<city>`
    Weather(String),
    /// `weather-<lat>,<lon>`
    WeatherAt(Coordinates),
    /// `notes-<city>`
    Notes(String),
    /// The landing city list
    Cities,
}

impl CacheKey {
    pub fn weather(city: impl Into<String>) -> Self {
        Self::Weather(city.into())
    }

    pub fn notes(city: impl Into<String>) -> Self {
        Self::Notes(city.into())
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Weather(city) => write!(f, "weather-{}", city),
            Self::WeatherAt(coords) => write!(f, "weather-{}", coords),
            Self::Notes(city) => write!(f, "notes-{}", city),
            Self::Cities => write!(f, "cities"),
        }
    }
}

/// Typed JSON facade over a [`KvStore`]. Cheap to clone; clones share the store.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn KvStore>,
}

impl Cache {
    pub fn new<S: KvStore + 'static>(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Cache backed by a [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Cache backed by the SQLite file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Ok(Self::new(SqliteStore::open(path)?))
    }

    pub fn put<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value).map_err(|e| StorageError::Encode(e.to_string()))?;
        self.store.put(&key.to_string(), &json)
    }

    /// Read and decode an entry. Malformed or unreadable entries are absent.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let stored = self.read(key)?;
        match serde_json::from_str(&stored.value) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring malformed cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// When the entry was last written.
    pub fn stored_at(&self, key: &CacheKey) -> Option<DateTime<Utc>> {
        self.read(key).map(|s| s.stored_at)
    }

    pub fn delete(&self, key: &CacheKey) -> Result<(), StorageError> {
        self.store.delete(&key.to_string())
    }

    fn read(&self, key: &CacheKey) -> Option<StoredValue> {
        match self.store.get(&key.to_string()) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Cache read for {} failed: {}", key, e);
                None
            }
        }
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}
