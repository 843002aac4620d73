//! Key namespace for the engine's slice of the state store.
//!
//! Every key the engine writes lives under one fixed prefix so `clear()`
//! can remove engine state without touching unrelated application settings
//! sharing the same backing medium.

/// Fixed prefix for every engine-owned key.
pub const PREFIX: &str = "sprig.";

/// The three independent dispatch-ledger namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchClass {
    /// One-shot alert dialogs.
    Alert,
    /// Breadcrumb/threshold effects.
    Effect,
    /// Artifacts produced by migration stages.
    Stage,
}

impl DispatchClass {
    /// Sub-namespace segment for this class.
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Effect => "effect",
            Self::Stage => "stage",
        }
    }
}

/// Key holding the activation ledger string set.
#[must_use]
pub fn activated_set() -> String {
    format!("{PREFIX}activated")
}

/// Key holding one dispatch-ledger string set.
#[must_use]
pub fn dispatched_set(class: DispatchClass) -> String {
    format!("{PREFIX}dispatched.{}", class.segment())
}

/// Key holding one persisted counter.
#[must_use]
pub fn counter(name: &str) -> String {
    format!("{PREFIX}counter.{name}")
}

/// Key holding the pending-alert map (JSON blob).
#[must_use]
pub fn pending_alerts() -> String {
    format!("{PREFIX}pending_alerts")
}

/// Key holding one migration stage's completion flag.
#[must_use]
pub fn stage_flag(stage_key: &str) -> String {
    format!("{PREFIX}stage.{stage_key}")
}

/// Key holding one auxiliary derived-state blob written by a stage.
#[must_use]
pub fn derived(name: &str) -> String {
    format!("{PREFIX}derived.{name}")
}

/// Returns true if `key` belongs to the engine's namespace.
#[must_use]
pub fn is_engine_key(key: &str) -> bool {
    key.starts_with(PREFIX)
}
