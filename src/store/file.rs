//! File-backed state-store backend.
//!
//! Persists the whole key space as one JSON snapshot, rewritten atomically
//! (write to a sibling temp file, then rename) on every mutation. The state
//! here is tiny — a few sets, counters, and flags — so snapshot-per-write is
//! simpler and safer than an append log.
//!
//! Degraded mode: if the snapshot cannot be loaded or written, the store
//! logs the failure and keeps serving from (and mutating) its in-memory
//! image. Reads then return defaults for anything never written this run,
//! and durability is lost, but the engine itself never observes an error.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::StoreIoError;
use crate::store::keys;
use crate::store::traits::{StateStore, StoredValue};

/// Durable [`StateStore`] backed by a JSON snapshot file.
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, StoredValue>>,
}

impl FileStateStore {
    /// Opens (or creates) a store at `path`.
    ///
    /// A missing file starts the store empty. A corrupt or unreadable file
    /// also starts it empty, after logging a warning; the engine then runs
    /// in best-effort mode until the next successful write replaces the
    /// snapshot.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::load(&path) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, "state snapshot unreadable; starting empty");
                BTreeMap::new()
            }
        };
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<BTreeMap<String, StoredValue>, StoreIoError> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let bytes = fs::read(path).map_err(|source| StoreIoError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|err| StoreIoError::Corrupt {
            path: path.display().to_string(),
            message: err.to_string(),
        })
    }

    fn persist(&self, entries: &BTreeMap<String, StoredValue>) {
        if let Err(err) = self.try_persist(entries) {
            tracing::debug!(error = %err, "snapshot write failed; state held in memory only");
        }
    }

    fn try_persist(&self, entries: &BTreeMap<String, StoredValue>) -> Result<(), StoreIoError> {
        let io_err = |source| StoreIoError::Io {
            path: self.path.display().to_string(),
            source,
        };

        let json = serde_json::to_vec_pretty(entries).map_err(|err| StoreIoError::Corrupt {
            path: self.path.display().to_string(),
            message: err.to_string(),
        })?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
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
                self.persist(&entries);
            }
            Err(_) => {
                tracing::debug!(key, "state store lock poisoned; dropping write");
            }
        }
    }
}

impl StateStore for FileStateStore {
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
            self.persist(&entries);
        }
    }
}
