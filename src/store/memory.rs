//! In-memory state-store backend.
//!
//! Thread-safe, non-durable. Intended for tests and for embedded hosts that
//! accept losing engine state on exit. Also the reference implementation of
//! the degraded-mode contract: a poisoned lock reads as defaults and drops
//! writes instead of panicking.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use crate::store::keys;
use crate::store::traits::{StateStore, StoredValue};

/// Volatile [`StateStore`] backed by a `BTreeMap`.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    entries: RwLock<BTreeMap<String, StoredValue>>,
}

impl InMemoryStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys (diagnostics only).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Returns true if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self, key: &str) -> Option<StoredValue> {
        match self.entries.read() {
            Ok(entries) => entries.get(key).cloned(),
            Err(_) => {
                tracing::debug!(key, "state store lock poisoned; reading default");
                None
            }
        }
    }

    fn write(&self, key: &str, value: StoredValue) {
        match self.entries.write() {
            Ok(mut entries) => {
                entries.insert(key.to_string(), value);
            }
            Err(_) => {
                tracing::debug!(key, "state store lock poisoned; dropping write");
            }
        }
    }
}

impl StateStore for InMemoryStateStore {
    fn get_i64(&self, key: &str, default: i64) -> i64 {
        match self.read(key) {
            Some(StoredValue::Int(v)) => v,
            _ => default,
        }
    }

    fn set_i64(&self, key: &str, value: i64) {
        self.write(key, StoredValue::Int(value));
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.read(key) {
            Some(StoredValue::Bool(v)) => v,
            _ => default,
        }
    }

    fn set_bool(&self, key: &str, value: bool) {
        self.write(key, StoredValue::Bool(value));
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        match self.read(key) {
            Some(StoredValue::String(v)) => v,
            _ => default.to_string(),
        }
    }

    fn set_string(&self, key: &str, value: &str) {
        self.write(key, StoredValue::String(value.to_string()));
    }

    fn get_string_set(&self, key: &str) -> BTreeSet<String> {
        match self.read(key) {
            Some(StoredValue::Set(v)) => v,
            _ => BTreeSet::new(),
        }
    }

    fn set_string_set(&self, key: &str, value: &BTreeSet<String>) {
        self.write(key, StoredValue::Set(value.clone()));
    }

    fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|key, _| !keys::is_engine_key(key));
        }
    }
}
