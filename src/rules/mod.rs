//! The declarative rule table.
//!
//! A [`RuleSpec`] couples a unique key with the events it cares about and a
//! pure predicate over (event, metadata, data source, ledger). Declaration
//! order is load-bearing: it decides evaluation order, and therefore which
//! rule's alert wins when several activate on one event.

pub mod catalog;

pub use catalog::catalog;

use crate::error::EngineResult;
use crate::metadata::Metadata;
use crate::store::Ledger;
use crate::RecipeDataSource;

/// Predicate signature: explicit dependency injection, no captured state
/// beyond the rule's own constants, so every rule is unit-testable in
/// isolation.
pub type RulePredicate =
    Box<dyn Fn(&str, &Metadata, &dyn RecipeDataSource, &Ledger) -> EngineResult<bool> + Send + Sync>;

/// One declarative engagement rule.
pub struct RuleSpec {
    /// Unique, immutable key; also the activation-ledger entry.
    pub key: &'static str,
    /// Events this rule is evaluated for.
    pub relevant_events: &'static [&'static str],
    /// The activation predicate. Must only read from its arguments.
    pub predicate: RulePredicate,
    /// Alert dispatched (at most once ever) when this rule activates.
    pub alert_id: Option<&'static str>,
    /// Breadcrumb/effect dispatched (at most once ever) when this rule
    /// activates.
    pub breadcrumb_id: Option<&'static str>,
}

impl RuleSpec {
    /// Creates a rule with no alert or breadcrumb attached.
    #[must_use]
    pub fn new(
        key: &'static str,
        relevant_events: &'static [&'static str],
        predicate: RulePredicate,
    ) -> Self {
        Self {
            key,
            relevant_events,
            predicate,
            alert_id: None,
            breadcrumb_id: None,
        }
    }

    /// Attaches an alert id.
    #[must_use]
    pub fn with_alert(mut self, alert_id: &'static str) -> Self {
        self.alert_id = Some(alert_id);
        self
    }

    /// Attaches a breadcrumb id.
    #[must_use]
    pub fn with_breadcrumb(mut self, breadcrumb_id: &'static str) -> Self {
        self.breadcrumb_id = Some(breadcrumb_id);
        self
    }

    /// Returns true if this rule should be evaluated for `event`.
    #[must_use]
    pub fn is_relevant(&self, event: &str) -> bool {
        self.relevant_events.contains(&event)
    }
}

impl std::fmt::Debug for RuleSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSpec")
            .field("key", &self.key)
            .field("relevant_events", &self.relevant_events)
            .field("alert_id", &self.alert_id)
            .field("breadcrumb_id", &self.breadcrumb_id)
            .finish_non_exhaustive()
    }
}

/// A persisted counter incremented by exactly one event name.
///
/// Increments happen once per qualifying event, before any predicate runs,
/// so predicates for that same event already see the updated value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSpec {
    /// Event that drives the counter.
    pub event: &'static str,
    /// Counter name (keyed under `sprig.counter.`).
    pub counter: &'static str,
}

/// The immutable rule table: rules, counters, and effect thresholds.
pub struct RuleSet {
    rules: Vec<RuleSpec>,
    counters: Vec<CounterSpec>,
    effect_thresholds: Vec<(u32, &'static str)>,
}

impl RuleSet {
    /// Builds a rule set. Thresholds are sorted ascending; duplicate rule
    /// keys are a programming error.
    #[must_use]
    pub fn new(
        rules: Vec<RuleSpec>,
        counters: Vec<CounterSpec>,
        mut effect_thresholds: Vec<(u32, &'static str)>,
    ) -> Self {
        debug_assert!(
            {
                let mut keys: Vec<_> = rules.iter().map(|r| r.key).collect();
                keys.sort_unstable();
                keys.windows(2).all(|w| w[0] != w[1])
            },
            "duplicate rule keys in rule set"
        );
        effect_thresholds.sort_unstable_by_key(|(threshold, _)| *threshold);
        Self {
            rules,
            counters,
            effect_thresholds,
        }
    }

    /// Rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[RuleSpec] {
        &self.rules
    }

    /// Counter specs.
    #[must_use]
    pub fn counters(&self) -> &[CounterSpec] {
        &self.counters
    }

    /// Effect thresholds, ascending.
    #[must_use]
    pub fn effect_thresholds(&self) -> &[(u32, &'static str)] {
        &self.effect_thresholds
    }

    /// Looks up a rule by key.
    #[must_use]
    pub fn rule(&self, key: &str) -> Option<&RuleSpec> {
        self.rules.iter().find(|r| r.key == key)
    }

    /// Looks up the rule carrying a given alert id.
    #[must_use]
    pub fn rule_for_alert(&self, alert_id: &str) -> Option<&RuleSpec> {
        self.rules.iter().find(|r| r.alert_id == Some(alert_id))
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        catalog()
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.rules.len())
            .field("counters", &self.counters.len())
            .field("effect_thresholds", &self.effect_thresholds)
            .finish()
    }
}
