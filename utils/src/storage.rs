//! Web storage abstraction (local and session storage).

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Local,
    Session,
}

impl StorageKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "localStorage",
            Self::Session => "sessionStorage",
        }
    }
}

/// A string key/value store with browser storage semantics.
///
/// Implementations are shared between concurrently running hooks; there is no
/// cross-key coordination.
pub trait WebStorage: Send + Sync {
    fn kind(&self) -> StorageKind;
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, item: &str);
    fn remove(&self, key: &str);
}

/// In-memory storage, used on hosts without a browser and in tests.
#[derive(Debug)]
pub struct MemoryStorage {
    kind: StorageKind,
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new(kind: StorageKind) -> Self {
        Self {
            kind,
            items: Mutex::new(BTreeMap::new()),
        }
    }

    #[must_use]
    pub fn with_items<'a>(
        kind: StorageKind,
        items: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let storage = Self::new(kind);
        {
            let mut map = storage.lock();
            for (k, v) in items {
                map.insert(k.to_string(), v.to_string());
            }
        }
        storage
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WebStorage for MemoryStorage {
    fn kind(&self) -> StorageKind {
        self.kind
    }

    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, item: &str) {
        let previous = self.lock().insert(key.to_string(), item.to_string());
        match previous {
            Some(previous) => tracing::debug!(
                storage = self.kind.as_str(),
                key,
                previous = %previous,
                item,
                "storage item updated"
            ),
            None => tracing::debug!(storage = self.kind.as_str(), key, item, "storage item set"),
        }
    }

    fn remove(&self, key: &str) {
        if self.lock().remove(key).is_some() {
            tracing::debug!(storage = self.kind.as_str(), key, "storage item removed");
        }
    }
}
