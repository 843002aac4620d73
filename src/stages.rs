//! Ordered, dependency-gated migration/calibration stages.
//!
//! Stages run in declared order on every reported event; each one
//! self-filters on the event name and completes at most once, recorded in a
//! persisted completion flag. A stage may declare a dependency on an earlier
//! stage, in which case it stays pending until the predecessor's flag is
//! set, even if its own condition would otherwise hold. Checking the
//! completion flag before the body makes repeated invocation prior to
//! completion safe.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::artifact::{ResponseArtifact, ResponsePayload};
use crate::datasource::{ContentKind, ContentPayload, ContentResolver};
use crate::error::EngineResult;
use crate::event;
use crate::metadata::Metadata;
use crate::rules::catalog::counters;
use crate::store::{DispatchClass, Ledger};
use crate::RecipeDataSource;

/// Outcome of one stage invocation.
#[derive(Debug, Default)]
pub struct StageOutcome {
    /// True when the stage's condition was satisfied and its flag should be
    /// set.
    pub complete: bool,
    /// Artifacts emitted by this invocation.
    pub artifacts: Vec<ResponseArtifact>,
}

impl StageOutcome {
    /// The stage did not trigger on this event; stays pending.
    #[must_use]
    pub fn pending() -> Self {
        Self::default()
    }

    /// The stage completed without emitting anything.
    #[must_use]
    pub fn complete() -> Self {
        Self {
            complete: true,
            artifacts: Vec::new(),
        }
    }

    /// The stage completed and emitted artifacts.
    #[must_use]
    pub fn complete_with(artifacts: Vec<ResponseArtifact>) -> Self {
        Self {
            complete: true,
            artifacts,
        }
    }
}

/// Stage body signature: the rule-predicate injection style plus the
/// external content resolver, which stages may consult for host-supplied
/// copy.
pub type StageBody = Box<
    dyn Fn(
            &str,
            &Metadata,
            &dyn RecipeDataSource,
            &dyn ContentResolver,
            &Ledger,
        ) -> EngineResult<StageOutcome>
        + Send
        + Sync,
>;

/// One migration/calibration stage: a two-state machine {pending, complete}
/// whose `complete` state is terminal and persisted.
pub struct MigrationStage {
    /// Unique stage key; also names the completion-flag store key.
    pub key: &'static str,
    /// Earlier stage whose completion gates this one.
    pub depends_on: Option<&'static str>,
    /// The stage condition/body. Runs only while pending (and unblocked).
    pub body: StageBody,
}

impl MigrationStage {
    /// Creates an independent stage.
    #[must_use]
    pub fn new(key: &'static str, body: StageBody) -> Self {
        Self {
            key,
            depends_on: None,
            body,
        }
    }

    /// Declares a dependency on an earlier stage.
    #[must_use]
    pub fn after(mut self, predecessor: &'static str) -> Self {
        self.depends_on = Some(predecessor);
        self
    }
}

impl std::fmt::Debug for MigrationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationStage")
            .field("key", &self.key)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

/// Runs the declared stage sequence against every event.
#[derive(Debug)]
pub struct StageRunner {
    stages: Vec<MigrationStage>,
}

impl StageRunner {
    /// Creates a runner over a fixed stage order.
    #[must_use]
    pub fn new(stages: Vec<MigrationStage>) -> Self {
        Self { stages }
    }

    /// Declared stages, in order.
    #[must_use]
    pub fn stages(&self) -> &[MigrationStage] {
        &self.stages
    }

    /// Evaluates every stage in declared order for one event.
    ///
    /// Completed stages are no-ops. A failing stage body is logged and left
    /// pending (retried on the next event); later stages still run.
    pub fn evaluate(
        &self,
        event: &str,
        metadata: &Metadata,
        data_source: &dyn RecipeDataSource,
        resolver: &dyn ContentResolver,
        ledger: &Ledger,
    ) -> Vec<ResponseArtifact> {
        let mut artifacts = Vec::new();
        for stage in &self.stages {
            // Flag first: completion is terminal.
            if ledger.stage_complete(stage.key) {
                continue;
            }
            if let Some(dep) = stage.depends_on {
                if !ledger.stage_complete(dep) {
                    continue;
                }
            }
            match (stage.body)(event, metadata, data_source, resolver, ledger) {
                Ok(outcome) => {
                    if outcome.complete {
                        ledger.mark_stage_complete(stage.key);
                    }
                    artifacts.extend(outcome.artifacts);
                }
                Err(err) => {
                    tracing::warn!(stage = stage.key, error = %err, "stage failed; left pending");
                }
            }
        }
        artifacts
    }
}

/// Auxiliary derived state written by the library audit for later stages
/// and developer tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    /// Total recipes at audit time.
    pub recipe_count: i64,
    /// Favorited recipes at audit time.
    pub favorite_count: i64,
    /// When the audit ran.
    pub recorded_at: chrono::DateTime<Utc>,
}

/// Stage keys, public so hosts and tests can inspect completion flags.
pub mod stage_keys {
    /// First-run library audit.
    pub const LIBRARY_AUDIT: &str = "library_audit";
    /// Favorite-counter reconciliation.
    pub const FAVORITES_RECOUNT: &str = "favorites_recount";
    /// Legacy cooked-date detection.
    pub const LEGACY_COOKED_DATES: &str = "legacy_cooked_dates";
}

/// Builds the production calibration sequence.
#[must_use]
pub fn calibration_stages() -> StageRunner {
    StageRunner::new(vec![
        // Stage 1: snapshot the library and seed counters that predate
        // counter tracking.
        MigrationStage::new(
            stage_keys::LIBRARY_AUDIT,
            Box::new(|event, _metadata, source, resolver, ledger| {
                if event != event::APP_OPENED {
                    return Ok(StageOutcome::pending());
                }
                let snapshot = LibrarySnapshot {
                    recipe_count: source.recipe_count()?,
                    favorite_count: source.favorite_count()?,
                    recorded_at: Utc::now(),
                };
                match serde_json::to_string(&snapshot) {
                    Ok(blob) => ledger.write_derived("library_snapshot", &blob),
                    Err(err) => tracing::warn!(error = %err, "library snapshot not serializable"),
                }

                // Installs older than counter tracking report at least this
                // session's open.
                if ledger.counter(counters::APP_OPENS) == 0 {
                    ledger.set_counter(counters::APP_OPENS, 1);
                }

                let mut artifacts = Vec::new();
                let notice_id = "library_audit_notice";
                if !ledger.is_dispatched(DispatchClass::Stage, notice_id) {
                    ledger.mark_dispatched(DispatchClass::Stage, notice_id);
                    let text = match resolver.resolve(ContentKind::Message, notice_id) {
                        Some(ContentPayload::Text(text)) => text,
                        _ => "Your recipe library has been checked and calibrated.".to_string(),
                    };
                    artifacts.push(
                        ResponseArtifact::new(ResponsePayload::SystemMessage {
                            text,
                            duration_seconds: Some(4),
                        })
                        .with_debug("stage:library_audit"),
                    );
                }
                Ok(StageOutcome::complete_with(artifacts))
            }),
        ),
        // Stage 2: reconcile the favorite baseline against the snapshot the
        // audit wrote. Gated on stage 1 so the snapshot exists.
        MigrationStage::new(
            stage_keys::FAVORITES_RECOUNT,
            Box::new(|event, _metadata, source, _resolver, ledger| {
                if event != event::APP_OPENED {
                    return Ok(StageOutcome::pending());
                }
                let favorites = source.favorite_count()?;
                ledger.write_derived("favorite_baseline", &favorites.to_string());
                Ok(StageOutcome::complete())
            }),
        )
        .after(stage_keys::LIBRARY_AUDIT),
        // Stage 3: surface the cooking-history panel for libraries that
        // already carry cooked dates from a previous app generation.
        MigrationStage::new(
            stage_keys::LEGACY_COOKED_DATES,
            Box::new(|event, _metadata, source, _resolver, ledger| {
                if event != event::APP_OPENED && event != event::RECIPE_IMPORTED {
                    return Ok(StageOutcome::pending());
                }
                let dated = source.recipes_with_cooked_date()?;
                if dated.is_empty() {
                    return Ok(StageOutcome::pending());
                }

                let mut artifacts = Vec::new();
                let patch_id = "history_panel_unlock";
                if !ledger.is_dispatched(DispatchClass::Stage, patch_id) {
                    ledger.mark_dispatched(DispatchClass::Stage, patch_id);
                    artifacts.push(
                        ResponseArtifact::new(ResponsePayload::UiPatch {
                            target: "history_panel".into(),
                            value: "visible".into(),
                            uses_remaining: None,
                        })
                        .with_debug("stage:legacy_cooked_dates"),
                    );
                }
                Ok(StageOutcome::complete_with(artifacts))
            }),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::datasource::NullResolver;
    use crate::error::DataSourceError;
    use crate::store::InMemoryStateStore;

    struct Library {
        recipes: i64,
        favorites: i64,
        cooked: Vec<String>,
        fail: bool,
    }

    impl Library {
        fn empty() -> Self {
            Self {
                recipes: 0,
                favorites: 0,
                cooked: Vec::new(),
                fail: false,
            }
        }
    }

    impl RecipeDataSource for Library {
        fn recipe_count(&self) -> Result<i64, DataSourceError> {
            if self.fail {
                return Err(DataSourceError::Unavailable {
                    message: "migrating".into(),
                });
            }
            Ok(self.recipes)
        }

        fn favorite_count(&self) -> Result<i64, DataSourceError> {
            Ok(self.favorites)
        }

        fn planned_meal_count(&self) -> Result<i64, DataSourceError> {
            Ok(0)
        }

        fn recipes_with_cooked_date(&self) -> Result<Vec<String>, DataSourceError> {
            Ok(self.cooked.clone())
        }
    }

    fn ledger() -> Ledger {
        Ledger::new(Arc::new(InMemoryStateStore::new()))
    }

    #[test]
    fn test_stage_completes_once_and_is_idempotent() {
        let runner = calibration_stages();
        let ledger = ledger();
        let library = Library {
            recipes: 12,
            favorites: 3,
            ..Library::empty()
        };

        let first = runner.evaluate("app_opened", &Metadata::new(), &library, &NullResolver, &ledger);
        assert!(ledger.stage_complete(stage_keys::LIBRARY_AUDIT));
        assert!(first
            .iter()
            .any(|a| a.payload.kind() == "system_message"));

        // Completed stages are no-ops; no duplicate side effects.
        let second = runner.evaluate("app_opened", &Metadata::new(), &library, &NullResolver, &ledger);
        assert!(second.is_empty());
    }

    #[test]
    fn test_stage_self_filters_on_event_name() {
        let runner = calibration_stages();
        let ledger = ledger();
        let library = Library::empty();

        runner.evaluate("recipe_viewed", &Metadata::new(), &library, &NullResolver, &ledger);
        assert!(!ledger.stage_complete(stage_keys::LIBRARY_AUDIT));
    }

    #[test]
    fn test_dependency_gates_completion() {
        let runner = calibration_stages();
        let ledger = ledger();
        let library = Library::empty();

        // Mark only stage 2's own condition satisfiable, with stage 1
        // artificially held back by a failing data source on its first
        // query.
        let failing = Library {
            fail: true,
            ..Library::empty()
        };
        runner.evaluate("app_opened", &Metadata::new(), &failing, &NullResolver, &ledger);
        assert!(!ledger.stage_complete(stage_keys::LIBRARY_AUDIT));
        assert!(!ledger.stage_complete(stage_keys::FAVORITES_RECOUNT));

        // Once the dependency completes, the dependent follows on the next
        // event.
        runner.evaluate("app_opened", &Metadata::new(), &library, &NullResolver, &ledger);
        assert!(ledger.stage_complete(stage_keys::LIBRARY_AUDIT));
        assert!(ledger.stage_complete(stage_keys::FAVORITES_RECOUNT));
    }

    #[test]
    fn test_failing_stage_left_pending_and_retried() {
        let runner = calibration_stages();
        let ledger = ledger();

        let failing = Library {
            fail: true,
            ..Library::empty()
        };
        let artifacts = runner.evaluate("app_opened", &Metadata::new(), &failing, &NullResolver, &ledger);
        assert!(!ledger.stage_complete(stage_keys::LIBRARY_AUDIT));
        assert!(artifacts.is_empty());

        let healthy = Library::empty();
        runner.evaluate("app_opened", &Metadata::new(), &healthy, &NullResolver, &ledger);
        assert!(ledger.stage_complete(stage_keys::LIBRARY_AUDIT));
    }

    #[test]
    fn test_library_audit_writes_snapshot_and_seeds_counter() {
        let runner = calibration_stages();
        let ledger = ledger();
        let library = Library {
            recipes: 7,
            favorites: 2,
            ..Library::empty()
        };

        runner.evaluate("app_opened", &Metadata::new(), &library, &NullResolver, &ledger);

        let blob = ledger.read_derived("library_snapshot");
        let snapshot: LibrarySnapshot = serde_json::from_str(&blob).unwrap();
        assert_eq!(snapshot.recipe_count, 7);
        assert_eq!(snapshot.favorite_count, 2);
        assert_eq!(ledger.counter(counters::APP_OPENS), 1);
    }

    #[test]
    fn test_audit_does_not_clobber_live_counter() {
        let runner = calibration_stages();
        let ledger = ledger();
        ledger.set_counter(counters::APP_OPENS, 42);

        runner.evaluate("app_opened", &Metadata::new(), &Library::empty(), &NullResolver, &ledger);
        assert_eq!(ledger.counter(counters::APP_OPENS), 42);
    }

    #[test]
    fn test_audit_message_uses_resolver_copy_when_available() {
        struct Copy;

        impl crate::ContentResolver for Copy {
            fn resolve(&self, kind: ContentKind, id: &str) -> Option<ContentPayload> {
                match (kind, id) {
                    (ContentKind::Message, "library_audit_notice") => {
                        Some(ContentPayload::Text("All tidied up!".into()))
                    }
                    _ => None,
                }
            }
        }

        let runner = calibration_stages();
        let ledger = ledger();
        let artifacts = runner.evaluate("app_opened", &Metadata::new(), &Library::empty(), &Copy, &ledger);

        assert!(artifacts.iter().any(|a| matches!(
            &a.payload,
            ResponsePayload::SystemMessage { text, .. } if text == "All tidied up!"
        )));
    }

    #[test]
    fn test_legacy_cooked_dates_pending_until_dated_records_exist() {
        let runner = calibration_stages();
        let ledger = ledger();

        runner.evaluate("app_opened", &Metadata::new(), &Library::empty(), &NullResolver, &ledger);
        assert!(!ledger.stage_complete(stage_keys::LEGACY_COOKED_DATES));

        let dated = Library {
            cooked: vec!["r1".into()],
            ..Library::empty()
        };
        let artifacts = runner.evaluate("recipe_imported", &Metadata::new(), &dated, &NullResolver, &ledger);
        assert!(ledger.stage_complete(stage_keys::LEGACY_COOKED_DATES));
        assert!(artifacts.iter().any(|a| a.payload.kind() == "ui_patch"));

        // The ui_patch id is guarded by the stage dispatch ledger.
        assert!(ledger.is_dispatched(DispatchClass::Stage, "history_panel_unlock"));
    }
}
