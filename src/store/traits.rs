//! Abstract state-store contract.
//!
//! The trait is deliberately infallible: reads return a caller-supplied
//! default when the backing medium has never written the key or is
//! unavailable, and writes are silently dropped in that degraded mode.
//! The engine keeps working (producing no artifacts at worst) even when
//! persistence is broken.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A value as held by a state-store backend.
///
/// Shared by both backends so the file store can snapshot the same shape
/// the in-memory store holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StoredValue {
    Bool(bool),
    Int(i64),
    String(String),
    Set(BTreeSet<String>),
}

/// Durable, namespaced key/value store for engine state.
///
/// Callers pass fully-namespaced keys (see [`super::keys`]). `clear` removes
/// only keys under the engine prefix; anything else sharing the medium is
/// left alone.
pub trait StateStore: Send + Sync {
    /// Reads an integer, or `default` if unset, mistyped, or unavailable.
    fn get_i64(&self, key: &str, default: i64) -> i64;

    /// Writes an integer. Best effort; never fails.
    fn set_i64(&self, key: &str, value: i64);

    /// Reads a boolean, or `default` if unset, mistyped, or unavailable.
    fn get_bool(&self, key: &str, default: bool) -> bool;

    /// Writes a boolean. Best effort; never fails.
    fn set_bool(&self, key: &str, value: bool);

    /// Reads a string, or `default` if unset, mistyped, or unavailable.
    fn get_string(&self, key: &str, default: &str) -> String;

    /// Writes a string. Best effort; never fails.
    fn set_string(&self, key: &str, value: &str);

    /// Reads a string set; empty if unset, mistyped, or unavailable.
    fn get_string_set(&self, key: &str) -> BTreeSet<String>;

    /// Writes a string set. Best effort; never fails.
    fn set_string_set(&self, key: &str, value: &BTreeSet<String>);

    /// Removes every key under the engine prefix.
    fn clear(&self);
}
