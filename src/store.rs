//! Key-value cache for cell-graph results.
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// A non-authoritative string cache shared between searches.
///
/// Values are derived deterministically from their keys, so concurrent writers never
/// disagree and `put_if_absent` is all the consistency needed.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` unless `key` is present; returns whether it was stored.
    fn put_if_absent(&self, key: &str, value: &str) -> bool;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put_if_absent(&self, key: &str, value: &str) -> bool {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        if map.contains_key(key) {
            return false;
        }
        map.insert(key.to_string(), value.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_put_if_absent() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert!(store.put_if_absent("CFa", "1"));
        assert!(!store.put_if_absent("CFa", "2"));
        assert_eq!(store.get("CFa").as_deref(), Some("1"));
        assert_eq!(store.get("IFa"), None);
        assert_eq!(store.len(), 1);
    }
}
