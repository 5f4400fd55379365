//! Key-value persistence seam.
//!
//! Report history is stored through [`KeyValueStore`] so the backing store
//! (browser-like session storage, a file, a database) stays outside the
//! orchestration core. [`MemoryStore`] is the in-process implementation.

use std::collections::HashMap;
use std::sync::Mutex;

/// String-keyed store with get/set/delete semantics.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String);

    /// Removes `key`. Returns `true` if a value was present.
    fn delete(&self, key: &str) -> bool;
}

/// In-memory [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .map_or(None, |entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
    }

    fn delete(&self, key: &str) -> bool {
        self.entries
            .lock()
            .is_ok_and(|mut entries| entries.remove(key).is_some())
    }
}
