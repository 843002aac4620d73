//! Loosely-typed event metadata.
//!
//! Every reported event carries a read-only bag of scalar values. Rule
//! predicates read it through typed accessors that return a caller-supplied
//! default on both absence and type mismatch; metadata access never fails.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Possible values a metadata field can hold.
///
/// # Examples
///
/// ```
/// use sprig::MetaValue;
///
/// let flag = MetaValue::Bool(true);
/// let count = MetaValue::Int(3);
///
/// assert_eq!(flag.as_bool(), Some(true));
/// assert_eq!(count.as_int(), Some(3));
/// assert_eq!(count.as_bool(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    List(Vec<String>),
}

impl MetaValue {
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Timestamp(_) => "timestamp",
            Self::List(_) => "list",
        }
    }
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for MetaValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<DateTime<Utc>> for MetaValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<Vec<String>> for MetaValue {
    fn from(v: Vec<String>) -> Self {
        Self::List(v)
    }
}

/// Read-only metadata bag attached to a reported event.
///
/// Accessors come in two flavors: `get_*` returning `Option<T>`, and
/// `*_or(default)` returning the default on absence or type mismatch.
/// Neither flavor can fail, matching the "malformed metadata defaults,
/// never raises" contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    fields: BTreeMap<String, MetaValue>,
}

impl Metadata {
    /// Creates an empty metadata bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts any convertible value (builder style).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Inserts a boolean (builder style).
    #[must_use]
    pub fn with_bool(self, key: impl Into<String>, value: bool) -> Self {
        self.with(key, value)
    }

    /// Inserts an integer (builder style).
    #[must_use]
    pub fn with_int(self, key: impl Into<String>, value: i64) -> Self {
        self.with(key, value)
    }

    /// Inserts a string (builder style).
    #[must_use]
    pub fn with_str(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value: String = value.into();
        self.with(key, value)
    }

    /// Returns true if the bag has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields in the bag.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Raw field lookup.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.fields.get(key)
    }

    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(MetaValue::as_bool)
    }

    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(MetaValue::as_int)
    }

    #[must_use]
    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(MetaValue::as_float)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(MetaValue::as_str)
    }

    #[must_use]
    pub fn get_timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        self.fields.get(key).and_then(MetaValue::as_timestamp)
    }

    /// Boolean with default on absence or mismatch.
    #[must_use]
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    /// Integer with default on absence or mismatch. Counts default to 0 at
    /// call sites.
    #[must_use]
    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    /// String with default on absence or mismatch.
    #[must_use]
    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_str(key).unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_value_accessors() {
        assert_eq!(MetaValue::Bool(true).as_bool(), Some(true));
        assert_eq!(MetaValue::Int(7).as_int(), Some(7));
        assert_eq!(MetaValue::Int(7).as_float(), Some(7.0)); // Int reads as float
        assert_eq!(MetaValue::String("x".into()).as_str(), Some("x"));
        assert_eq!(MetaValue::Bool(true).as_int(), None);
    }

    #[test]
    fn test_meta_value_type_name() {
        assert_eq!(MetaValue::Bool(false).type_name(), "bool");
        assert_eq!(MetaValue::Timestamp(Utc::now()).type_name(), "timestamp");
        assert_eq!(MetaValue::List(vec![]).type_name(), "list");
    }

    #[test]
    fn test_metadata_builder_and_lookup() {
        let meta = Metadata::new()
            .with_bool("is_adding", true)
            .with_int("planned_days", 4)
            .with_str("source", "url");

        assert_eq!(meta.len(), 3);
        assert_eq!(meta.get_bool("is_adding"), Some(true));
        assert_eq!(meta.get_int("planned_days"), Some(4));
        assert_eq!(meta.get_str("source"), Some("url"));
    }

    #[test]
    fn test_metadata_defaults_on_absence() {
        let meta = Metadata::new();
        assert!(!meta.bool_or("missing", false));
        assert_eq!(meta.int_or("missing", 0), 0);
        assert_eq!(meta.str_or("missing", "fallback"), "fallback");
    }

    #[test]
    fn test_metadata_defaults_on_type_mismatch() {
        let meta = Metadata::new().with_str("planned_days", "three");
        // Wrong-typed field behaves exactly like an absent one.
        assert_eq!(meta.get_int("planned_days"), None);
        assert_eq!(meta.int_or("planned_days", 0), 0);
    }

    #[test]
    fn test_metadata_serialization() {
        let meta = Metadata::new().with_int("n", 2).with_bool("f", true);
        let json = serde_json::to_string(&meta).unwrap();
        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, back);
    }

    #[test]
    fn test_metadata_timestamp() {
        let now = Utc::now();
        let meta = Metadata::new().with("at", now);
        assert_eq!(meta.get_timestamp("at"), Some(now));
        assert_eq!(meta.get_timestamp("missing"), None);
    }
}
