//! The engine context object and event ingress.
//!
//! One [`Engine`] is constructed at process start and lives for the
//! process's duration. It owns the queue, the session fire flag, and the
//! wiring between evaluator, responder, and stage runner. `report_event` is
//! fire-and-forget for the caller; everything that can fail inside degrades
//! to "no artifact" and goes to the diagnostics sink instead of the caller.

use std::sync::{Arc, Mutex};

use crate::artifact::{ResponseArtifact, ResponseQueue};
use crate::datasource::{ContentResolver, NullResolver};
use crate::evaluator::Evaluator;
use crate::metadata::Metadata;
use crate::responder::Responder;
use crate::rules::RuleSet;
use crate::stages::{calibration_stages, StageRunner};
use crate::store::{Ledger, StateStore};
use crate::RecipeDataSource;

/// Per-process mutable state, serialized under one lock.
///
/// Counter increments and activation checks are read-modify-write against
/// the store, and the session flag must be visible to every evaluation in
/// the process, so the whole report path runs under this mutex.
struct SessionState {
    session_fired: bool,
}

/// The engagement engine.
pub struct Engine {
    ledger: Ledger,
    data_source: Arc<dyn RecipeDataSource>,
    resolver: Arc<dyn ContentResolver>,
    evaluator: Evaluator,
    responder: Responder,
    stage_runner: StageRunner,
    queue: ResponseQueue,
    session: Mutex<SessionState>,
}

impl Engine {
    /// Creates an engine with the production rule catalog and calibration
    /// stages.
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>, data_source: Arc<dyn RecipeDataSource>) -> Self {
        Self::with_parts(
            store,
            data_source,
            Arc::new(RuleSet::default()),
            calibration_stages(),
        )
    }

    /// Creates an engine with a custom rule table and stage sequence
    /// (tests, staged rollouts).
    #[must_use]
    pub fn with_parts(
        store: Arc<dyn StateStore>,
        data_source: Arc<dyn RecipeDataSource>,
        rules: Arc<RuleSet>,
        stage_runner: StageRunner,
    ) -> Self {
        Self {
            ledger: Ledger::new(store),
            data_source,
            resolver: Arc::new(NullResolver),
            evaluator: Evaluator::new(Arc::clone(&rules)),
            responder: Responder::new(rules),
            stage_runner,
            queue: ResponseQueue::new(),
            session: Mutex::new(SessionState {
                session_fired: false,
            }),
        }
    }

    /// Replaces the content resolver (host-supplied copy catalog).
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn ContentResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Primary ingress: evaluates rules, derives responses, runs stages,
    /// and appends everything produced to the response queue, in that
    /// order.
    ///
    /// Fire-and-forget: nothing is returned and nothing propagates to the
    /// caller. Concurrent calls are serialized on the engine's internal
    /// lock.
    pub fn report_event(&self, event: &str, metadata: &Metadata) {
        let Ok(mut session) = self.session.lock() else {
            tracing::error!(event, "engine lock poisoned; event dropped");
            return;
        };

        let activated = self
            .evaluator
            .evaluate(event, metadata, self.data_source.as_ref(), &self.ledger);
        if !activated.is_empty() {
            tracing::debug!(event, ?activated, "rules activated");
        }

        let mut artifacts: Vec<ResponseArtifact> = Vec::new();

        artifacts.extend(self.responder.derive_alerts(
            &activated,
            event,
            &self.ledger,
            &mut session.session_fired,
        ));
        artifacts.extend(self.responder.check_pending_alert(
            event,
            &self.ledger,
            &mut session.session_fired,
        ));
        artifacts.extend(self.responder.derive_breadcrumbs(
            &activated,
            &self.ledger,
            &mut session.session_fired,
        ));
        artifacts.extend(self.responder.derive_effects(
            self.ledger.activated_count(),
            &self.ledger,
            &mut session.session_fired,
        ));
        artifacts.extend(self.stage_runner.evaluate(
            event,
            metadata,
            self.data_source.as_ref(),
            self.resolver.as_ref(),
            &self.ledger,
        ));

        self.queue.extend(artifacts);
    }

    /// Destructive drain of everything queued so far.
    ///
    /// Exactly-once per call: two consecutive drains with no intervening
    /// event return `[]` on the second.
    #[must_use]
    pub fn drain_responses(&self) -> Vec<ResponseArtifact> {
        self.queue.drain()
    }

    /// Read-only view of the persistent ledger (host tooling, tests).
    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Wipes every engine-owned key from the store. The session flag and
    /// queue are process state and are not touched.
    pub fn clear_state(&self) {
        self.ledger.clear();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}
