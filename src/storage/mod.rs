//! Client-persisted storage capabilities
//!
//! Storage is injected as a [`KeyValueStorage`] rather than reached through
//! an ambient global, so the sanitizer runs against any backing area.
//!
//! - [`sanitizer`] - purges identity-provider artifacts before auth calls

pub mod sanitizer;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

pub use sanitizer::{StorageSanitizer, DEFAULT_PROVIDER_KEY_PATTERN};

/// Lifetime class of a storage area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArea {
    /// Survives restarts (browser `localStorage` equivalent)
    Durable,
    /// Cleared with the tab/session (`sessionStorage` equivalent)
    SessionScoped,
}

/// Minimal key-value interface the sanitizer needs
pub trait KeyValueStorage: Send + Sync {
    /// Which area this store represents
    fn area(&self) -> StorageArea;

    /// Snapshot of every key currently stored
    fn keys(&self) -> Vec<String>;

    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str);

    /// Remove `key`; removing a missing key is a no-op
    fn remove(&self, key: &str);
}

/// In-process key-value storage
#[derive(Debug)]
pub struct MemoryStorage {
    area: StorageArea,
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new(area: StorageArea) -> Self {
        Self {
            area,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Convenience constructor returning a shareable handle
    #[must_use]
    pub fn shared(area: StorageArea) -> Arc<Self> {
        Arc::new(Self::new(area))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStorage for MemoryStorage {
    fn area(&self) -> StorageArea {
        self.area
    }

    fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new(StorageArea::Durable);
        assert!(storage.is_empty());

        storage.set("theme", "dark");
        assert_eq!(storage.get("theme").as_deref(), Some("dark"));
        assert_eq!(storage.keys(), vec!["theme".to_string()]);

        storage.remove("theme");
        storage.remove("theme");
        assert!(storage.get("theme").is_none());
        assert_eq!(storage.area(), StorageArea::Durable);
    }
}
