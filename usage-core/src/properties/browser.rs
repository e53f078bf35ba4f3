//! Web-storage-backed properties.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use super::{PersistentProperties, PropertyMap};
use crate::error::{Error, Result};

/// Minimal view of a browser `Storage` object
pub trait WebStorage: Send + Sync {
    /// Read an entry
    fn get_item(&self, key: &str) -> Option<String>;

    /// Overwrite an entry; fails when the quota is exceeded or storage is off
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

/// Properties kept as one JSON entry named after the application
pub struct BrowserProperties<S: WebStorage> {
    name: String,
    storage: S,
    map: PropertyMap,
}

impl<S: WebStorage> BrowserProperties<S> {
    pub fn new(name: &str, storage: S) -> Self {
        let raw = storage.get_item(name);
        Self {
            name: name.to_string(),
            map: PropertyMap::parse(raw.as_deref()),
            storage,
        }
    }

    /// Backing storage
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

impl<S: WebStorage> PersistentProperties for BrowserProperties<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.map.get(key)
    }

    fn set(&mut self, key: &str, value: Option<Value>) {
        if !self.map.apply(key, value) {
            return;
        }
        let result = self
            .map
            .to_json()
            .and_then(|json| self.storage.set_item(&self.name, &json));
        if let Err(e) = result {
            tracing::debug!(name = %self.name, error = %e, "Dropping properties write");
        }
    }
}

/// Web storage held in memory
///
/// Clones share the same entries, so a store rebuilt from a clone sees what
/// an earlier store wrote, just like reopening a page.
#[derive(Debug, Clone, Default)]
pub struct MemoryWebStorage {
    inner: Arc<Mutex<MemoryWebStorageInner>>,
}

#[derive(Debug, Default)]
struct MemoryWebStorageInner {
    items: HashMap<String, String>,
    writes: usize,
    read_only: bool,
}

impl MemoryWebStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every write, like a storage over quota
    pub fn set_read_only(&self, read_only: bool) {
        self.lock().read_only = read_only;
    }

    /// Number of successful writes
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryWebStorageInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl WebStorage for MemoryWebStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.lock().items.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.lock();
        if inner.read_only {
            return Err(Error::Storage("storage quota exceeded".to_string()));
        }
        inner.items.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }
}

/// `window.localStorage`
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }
}

#[cfg(target_arch = "wasm32")]
impl WebStorage for LocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok()?
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let storage =
            Self::storage().ok_or_else(|| Error::Storage("local storage is unavailable".to_string()))?;
        storage
            .set_item(key, value)
            .map_err(|_| Error::Storage("failed to write local storage".to_string()))
    }
}
