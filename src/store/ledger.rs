//! Typed ledger over the raw state store.
//!
//! Wraps the namespaced key/value surface with the engine's actual nouns:
//! activation set, dispatch sets, counters, the pending-alert map, stage
//! completion flags, and auxiliary derived-state blobs. All methods inherit
//! the store's never-fails contract.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::store::keys::{self, DispatchClass};
use crate::store::traits::StateStore;

/// Typed view of the engine's persistent state.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn StateStore>,
}

impl Ledger {
    /// Wraps a state store.
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    // --- activation ledger -------------------------------------------------

    /// Returns true if the rule key has ever evaluated true.
    #[must_use]
    pub fn is_activated(&self, rule_key: &str) -> bool {
        self.store
            .get_string_set(&keys::activated_set())
            .contains(rule_key)
    }

    /// Permanently records a rule activation. Monotonic; re-adding is a
    /// no-op.
    pub fn mark_activated(&self, rule_key: &str) {
        let key = keys::activated_set();
        let mut set = self.store.get_string_set(&key);
        if set.insert(rule_key.to_string()) {
            self.store.set_string_set(&key, &set);
        }
    }

    /// Total number of rules ever activated.
    #[must_use]
    pub fn activated_count(&self) -> usize {
        self.store.get_string_set(&keys::activated_set()).len()
    }

    // --- dispatch ledgers --------------------------------------------------

    /// Returns true if `id` was ever dispatched in `class`'s namespace.
    #[must_use]
    pub fn is_dispatched(&self, class: DispatchClass, id: &str) -> bool {
        self.store
            .get_string_set(&keys::dispatched_set(class))
            .contains(id)
    }

    /// Permanently records a dispatch.
    pub fn mark_dispatched(&self, class: DispatchClass, id: &str) {
        let key = keys::dispatched_set(class);
        let mut set = self.store.get_string_set(&key);
        if set.insert(id.to_string()) {
            self.store.set_string_set(&key, &set);
        }
    }

    // --- counters ----------------------------------------------------------

    /// Current counter value (0 if never incremented).
    #[must_use]
    pub fn counter(&self, name: &str) -> i64 {
        self.store.get_i64(&keys::counter(name), 0)
    }

    /// Increments a counter by one and returns the new value.
    pub fn increment_counter(&self, name: &str) -> i64 {
        let key = keys::counter(name);
        let next = self.store.get_i64(&key, 0).saturating_add(1);
        self.store.set_i64(&key, next);
        next
    }

    /// Overwrites a counter (used by calibration stages).
    pub fn set_counter(&self, name: &str, value: i64) {
        self.store.set_i64(&keys::counter(name), value);
    }

    // --- pending alerts ----------------------------------------------------

    /// The persisted pending-alert map: alert id -> trigger event name.
    ///
    /// A corrupt blob reads as empty; the next upsert rewrites it whole.
    #[must_use]
    pub fn pending_alerts(&self) -> BTreeMap<String, String> {
        let raw = self.store.get_string(&keys::pending_alerts(), "{}");
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "pending-alert blob corrupt; treating as empty");
            BTreeMap::new()
        })
    }

    /// Idempotently records that `alert_id` should replay when
    /// `trigger_event` is next reported with the session budget free.
    pub fn upsert_pending_alert(&self, alert_id: &str, trigger_event: &str) {
        let mut pending = self.pending_alerts();
        pending.insert(alert_id.to_string(), trigger_event.to_string());
        self.write_pending(&pending);
    }

    /// Removes a pending entry once its alert has actually dispatched.
    pub fn remove_pending_alert(&self, alert_id: &str) {
        let mut pending = self.pending_alerts();
        if pending.remove(alert_id).is_some() {
            self.write_pending(&pending);
        }
    }

    fn write_pending(&self, pending: &BTreeMap<String, String>) {
        match serde_json::to_string(pending) {
            Ok(json) => self.store.set_string(&keys::pending_alerts(), &json),
            Err(err) => tracing::warn!(error = %err, "pending-alert blob not serializable"),
        }
    }

    // --- migration stages --------------------------------------------------

    /// Returns true if the stage's completion flag is set.
    #[must_use]
    pub fn stage_complete(&self, stage_key: &str) -> bool {
        self.store.get_bool(&keys::stage_flag(stage_key), false)
    }

    /// Sets a stage's completion flag. Terminal; never cleared except by
    /// `clear()`.
    pub fn mark_stage_complete(&self, stage_key: &str) {
        self.store.set_bool(&keys::stage_flag(stage_key), true);
    }

    /// Writes an auxiliary derived-state blob for later stages to read.
    pub fn write_derived(&self, name: &str, blob: &str) {
        self.store.set_string(&keys::derived(name), blob);
    }

    /// Reads an auxiliary derived-state blob ("" if absent).
    #[must_use]
    pub fn read_derived(&self, name: &str) -> String {
        self.store.get_string(&keys::derived(name), "")
    }

    // --- lifecycle ---------------------------------------------------------

    /// Removes every engine-owned key from the backing store.
    pub fn clear(&self) {
        self.store.clear();
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("activated", &self.activated_count())
            .finish_non_exhaustive()
    }
}
