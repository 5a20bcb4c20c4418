//! Key-Value Store
//!
//! The persistence contract every store service builds on: string values
//! under string keys, last writer wins. Collections are kept as one JSON
//! document per key.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::storage::database::Database;
use crate::utils::error::{AppError, AppResult};

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// SQLite-backed store
#[derive(Clone)]
pub struct SqliteKvStore {
    db: Database,
}

impl SqliteKvStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.db.get_value(key)
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.db.set_value(key, value)
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.db.delete_value(key)
    }
}

/// Volatile store
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| AppError::internal("memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Serializes the load-modify-save cycles a service runs on its documents.
///
/// Every writer of a document takes the lock before reading it, so two
/// concurrent updates of one collection cannot drop each other's records.
#[derive(Debug, Default)]
pub struct WriteLock(Mutex<()>);

impl WriteLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> AppResult<MutexGuard<'_, ()>> {
        self.0
            .lock()
            .map_err(|_| AppError::internal("store write lock poisoned"))
    }
}

/// Read the JSON document under `key`.
///
/// A missing key or a document that no longer parses yields `T::default()`.
pub fn load_json<T>(store: &dyn KeyValueStore, key: &str) -> AppResult<T>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.get(key)? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "corrupt JSON in store, treating as empty");
            Ok(T::default())
        }
    }
}

/// Write `value` as the JSON document under `key`
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> AppResult<()> {
    let raw = serde_json::to_string(value)?;
    tracing::debug!(key, bytes = raw.len(), "store write");
    store.set(key, &raw)
}
