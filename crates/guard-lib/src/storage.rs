// ============================
// crates/guard-lib/src/storage.rs
// ============================
//! Tab-scoped key/value storage with in-memory and flat-file implementations.
//!
//! Values are opaque strings. The flat-file store keeps one JSON document per
//! tab so that a restarted host pointed at the same directory sees the same
//! values, the way a reloaded page sees its `sessionStorage`.

use crate::error::GuardError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Well-known keys in the tab store
pub mod keys {
    /// Opaque id of the current session
    pub const SESSION_ID: &str = "sessionId";
    /// Last recognised activity, ms since the epoch
    pub const LAST_ACTIVITY: &str = "lastActivity";
    /// Anti-forgery token bound to the session
    pub const CSRF_TOKEN: &str = "csrfToken";
    /// Identity cached by the host after sign-in
    pub const CURRENT_USER: &str = "currentUser";
    /// Backend access token cached by the host
    pub const AUTH_TOKEN: &str = "authToken";
}

/// File name of the flat-file store inside its directory
const STORE_FILE: &str = "tab-store.json";

/// Errors raised by a tab store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store full: {used} of {limit} bytes in use")]
    Full { used: usize, limit: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait for tab-scoped stores
pub trait TabStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Remove every value
    fn clear(&self) -> Result<(), StoreError>;
}

/// Read a value, treating any store failure as "not present"
pub(crate) fn get_lossy(store: &dyn TabStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            let err = GuardError::from(e);
            tracing::warn!(
                key,
                error = %err,
                code = err.error_code(),
                "tab store read failed, treating as empty"
            );
            None
        },
    }
}

/// Write a value, logging instead of propagating a store failure
pub(crate) fn set_lossy(store: &dyn TabStore, key: &str, value: &str) {
    if let Err(e) = store.set(key, value) {
        let err = GuardError::from(e);
        tracing::warn!(
            key,
            error = %err,
            code = err.error_code(),
            "tab store write failed, continuing in memory"
        );
    }
}

/// Clear the store, logging instead of propagating a store failure
pub(crate) fn clear_lossy(store: &dyn TabStore) {
    if let Err(e) = store.clear() {
        let err = GuardError::from(e);
        tracing::warn!(error = %err, code = err.error_code(), "tab store clear failed");
    }
}

/// Size of a key/value map the way browsers account for storage quota
fn used_bytes(values: &HashMap<String, String>) -> usize {
    values.iter().map(|(k, v)| k.len() + v.len()).sum()
}

/// In-memory store living as long as the value itself
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    limit: Option<usize>,
}

impl MemoryStore {
    /// Create an unbounded store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that refuses writes past `limit` bytes
    pub fn with_limit(limit: usize) -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            limit: Some(limit),
        }
    }
}

impl TabStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock();
        if let Some(limit) = self.limit {
            let previous = values.get(key).map_or(0, |v| key.len() + v.len());
            let used = used_bytes(&values) - previous + key.len() + value.len();
            if used > limit {
                return Err(StoreError::Full { used, limit });
            }
        }
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.values.lock().clear();
        Ok(())
    }
}

/// Flat-file store: a JSON object in `<root>/tab-store.json`
#[derive(Debug)]
pub struct FlatFileStore {
    path: PathBuf,
    cache: Mutex<HashMap<String, String>>,
}

impl FlatFileStore {
    /// Open (or create) the store rooted at `root`
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        let path = root.join(STORE_FILE);

        let cache = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            cache: Mutex::new(cache),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the map to disk through a temp file so a crash never leaves half a document
    fn flush(&self, values: &HashMap<String, String>) -> Result<(), StoreError> {
        let json = serde_json::to_string(values)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl TabStore for FlatFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.cache.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.cache.lock();
        values.insert(key.to_string(), value.to_string());
        self.flush(&values)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.cache.lock();
        if values.remove(key).is_some() {
            self.flush(&values)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut values = self.cache.lock();
        values.clear();
        self.flush(&values)
    }
}
