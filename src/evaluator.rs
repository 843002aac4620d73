//! Rule evaluation.
//!
//! One pass per reported event: counter side-effects first, then every
//! not-yet-activated rule whose relevant-event set contains the event, in
//! declaration order. Activation is persisted immediately, so a rule key
//! returned here will never be returned again for the store's lifetime.

use std::sync::Arc;

use crate::metadata::Metadata;
use crate::rules::RuleSet;
use crate::store::Ledger;
use crate::RecipeDataSource;

/// Applies counters and rule predicates for incoming events.
#[derive(Debug)]
pub struct Evaluator {
    rules: Arc<RuleSet>,
}

impl Evaluator {
    /// Creates an evaluator over an immutable rule table.
    #[must_use]
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    /// Evaluates `event` and returns the newly activated rule keys, in
    /// declaration order.
    ///
    /// Counter increments are gated strictly on event-name equality and
    /// happen before any predicate runs, so predicates for the same event
    /// observe the post-increment value.
    ///
    /// A predicate error counts as `false` for this evaluation: the rule
    /// stays inactive (and will be re-evaluated on a later relevant event),
    /// the error goes to the diagnostics sink, and remaining rules still
    /// run.
    pub fn evaluate(
        &self,
        event: &str,
        metadata: &Metadata,
        data_source: &dyn RecipeDataSource,
        ledger: &Ledger,
    ) -> Vec<String> {
        for counter in self.rules.counters() {
            if counter.event == event {
                ledger.increment_counter(counter.counter);
            }
        }

        let mut activated = Vec::new();
        for rule in self.rules.rules() {
            if !rule.is_relevant(event) || ledger.is_activated(rule.key) {
                continue;
            }
            match (rule.predicate)(event, metadata, data_source, ledger) {
                Ok(true) => {
                    ledger.mark_activated(rule.key);
                    activated.push(rule.key.to_string());
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(rule = rule.key, error = %err, "predicate failed; treated as false");
                }
            }
        }
        activated
    }
}
