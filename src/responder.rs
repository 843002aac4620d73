//! Response derivation.
//!
//! Translates newly activated rule keys and global activation counts into
//! response artifacts while enforcing the two delivery guarantees:
//!
//! - per-identifier at-most-once-ever dispatch (backed by the persisted
//!   dispatch ledgers), and
//! - at most one alert- or effect-class artifact per process run (the
//!   session fire guard).
//!
//! An alert blocked by the session guard is deferred into the persisted
//! pending queue keyed by the event that made it eligible, and replays in a
//! later run whose matching event arrives with the budget still free. The
//! single-fire budget prevents bursty deliveries when many rules activate at
//! once (first-run backfill); the pending queue guarantees deferral is not
//! loss.

use std::sync::Arc;

use crate::artifact::{ResponseArtifact, ResponsePayload};
use crate::rules::RuleSet;
use crate::store::{DispatchClass, Ledger};

/// Derives alert/effect artifacts from activation state.
#[derive(Debug)]
pub struct Responder {
    rules: Arc<RuleSet>,
}

impl Responder {
    /// Creates a responder over the same rule table the evaluator uses.
    #[must_use]
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    /// Derives at most one alert artifact from this event's activations.
    ///
    /// The first activated key (declaration order) carrying an undispatched
    /// alert id wins the session budget; every other eligible alert id is
    /// upserted into the pending queue keyed by `current_event`. With the
    /// budget already spent on entry, all eligible ids go to the queue.
    pub fn derive_alerts(
        &self,
        activated: &[String],
        current_event: &str,
        ledger: &Ledger,
        session_fired: &mut bool,
    ) -> Vec<ResponseArtifact> {
        let mut artifacts = Vec::new();
        for key in activated {
            let Some(rule) = self.rules.rule(key) else {
                continue;
            };
            let Some(alert_id) = rule.alert_id else {
                continue;
            };
            if ledger.is_dispatched(DispatchClass::Alert, alert_id) {
                continue;
            }
            if *session_fired {
                ledger.upsert_pending_alert(alert_id, current_event);
            } else {
                ledger.mark_dispatched(DispatchClass::Alert, alert_id);
                *session_fired = true;
                artifacts.push(ResponseArtifact::new(ResponsePayload::Alert {
                    alert_id: alert_id.to_string(),
                    spec_key: rule.key.to_string(),
                }));
            }
        }
        artifacts
    }

    /// Replays a deferred alert whose stored trigger event matches
    /// `current_event`, if the session budget is still free.
    pub fn check_pending_alert(
        &self,
        current_event: &str,
        ledger: &Ledger,
        session_fired: &mut bool,
    ) -> Option<ResponseArtifact> {
        if *session_fired {
            return None;
        }
        for (alert_id, trigger_event) in ledger.pending_alerts() {
            if trigger_event != current_event {
                continue;
            }
            ledger.remove_pending_alert(&alert_id);
            if ledger.is_dispatched(DispatchClass::Alert, &alert_id) {
                // Stale entry; the alert already went out some other way.
                continue;
            }
            ledger.mark_dispatched(DispatchClass::Alert, &alert_id);
            *session_fired = true;

            let spec_key = self
                .rules
                .rule_for_alert(&alert_id)
                .map(|rule| rule.key.to_string())
                .unwrap_or_default();
            return Some(ResponseArtifact::new(ResponsePayload::Alert {
                alert_id,
                spec_key,
            }));
        }
        None
    }

    /// Derives at most one breadcrumb artifact from this event's
    /// activations.
    ///
    /// Breadcrumbs share the effect dispatch ledger and the session budget;
    /// unlike alerts they are never deferred - an undelivered breadcrumb
    /// simply stays eligible until its id is dispatched.
    pub fn derive_breadcrumbs(
        &self,
        activated: &[String],
        ledger: &Ledger,
        session_fired: &mut bool,
    ) -> Option<ResponseArtifact> {
        if *session_fired {
            return None;
        }
        for key in activated {
            let Some(rule) = self.rules.rule(key) else {
                continue;
            };
            let Some(breadcrumb_id) = rule.breadcrumb_id else {
                continue;
            };
            if ledger.is_dispatched(DispatchClass::Effect, breadcrumb_id) {
                continue;
            }
            ledger.mark_dispatched(DispatchClass::Effect, breadcrumb_id);
            *session_fired = true;
            return Some(ResponseArtifact::new(ResponsePayload::Effect {
                effect_key: breadcrumb_id.to_string(),
                threshold: None,
            }));
        }
        None
    }

    /// Derives at most one threshold effect from the total activation count.
    ///
    /// Thresholds are checked in ascending order and the scan stops at the
    /// first satisfied, undispatched one, so a higher threshold can never
    /// fire before a lower undispatched one in the same pass.
    pub fn derive_effects(
        &self,
        total_activated: usize,
        ledger: &Ledger,
        session_fired: &mut bool,
    ) -> Option<ResponseArtifact> {
        if *session_fired {
            return None;
        }
        for &(threshold, effect_key) in self.rules.effect_thresholds() {
            if total_activated < threshold as usize {
                // Ascending order: nothing later can match either.
                break;
            }
            if ledger.is_dispatched(DispatchClass::Effect, effect_key) {
                continue;
            }
            ledger.mark_dispatched(DispatchClass::Effect, effect_key);
            *session_fired = true;
            return Some(ResponseArtifact::new(ResponsePayload::Effect {
                effect_key: effect_key.to_string(),
                threshold: Some(threshold),
            }));
        }
        None
    }
}
