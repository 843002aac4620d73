//! End-to-end engine behavior over the production catalog.

use std::sync::Arc;

use sprig::artifact::ResponsePayload;
use sprig::error::DataSourceError;
use sprig::rules::{RuleSet, RuleSpec};
use sprig::stages::StageRunner;
use sprig::store::InMemoryStateStore;
use sprig::{Engine, Metadata, RecipeDataSource};

struct Library {
    recipes: i64,
    favorites: i64,
    cooked: Vec<String>,
}

impl Library {
    fn new(recipes: i64, favorites: i64) -> Self {
        Self {
            recipes,
            favorites,
            cooked: Vec::new(),
        }
    }
}

impl RecipeDataSource for Library {
    fn recipe_count(&self) -> Result<i64, DataSourceError> {
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

fn engine_with(library: Library) -> Engine {
    Engine::new(Arc::new(InMemoryStateStore::new()), Arc::new(library))
}

#[test]
fn favourite_breadth_activates_and_queues_one_artifact() {
    let engine = engine_with(Library::new(20, 5));

    engine.report_event(
        "favorite_added",
        &Metadata::new().with_bool("is_adding", true),
    );

    let drained = engine.drain_responses();
    assert_eq!(drained.len(), 1);
    assert_eq!(
        drained[0].payload,
        ResponsePayload::Alert {
            alert_id: "favourites_tour".into(),
            spec_key: "favourite_breadth".into(),
        }
    );
    assert!(engine.ledger().is_activated("favourite_breadth"));
}

#[test]
fn repeated_event_activates_only_once() {
    let engine = engine_with(Library::new(20, 5));
    let metadata = Metadata::new().with_bool("is_adding", true);

    engine.report_event("favorite_added", &metadata);
    assert_eq!(engine.drain_responses().len(), 1);

    for _ in 0..9 {
        engine.report_event("favorite_added", &metadata);
        assert!(engine.drain_responses().is_empty());
    }
    assert_eq!(engine.ledger().activated_count(), 1);
}

#[test]
fn simultaneous_alerts_defer_declaration_order_loser() {
    // recipe_created with a 10-recipe library satisfies both first_recipe
    // and recipe_collector in one call.
    let engine = engine_with(Library::new(10, 0));

    engine.report_event("recipe_created", &Metadata::new());

    let drained = engine.drain_responses();
    let alerts: Vec<_> = drained
        .iter()
        .filter_map(|a| match &a.payload {
            ResponsePayload::Alert { alert_id, .. } => Some(alert_id.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(alerts, vec!["welcome_chef".to_string()]);

    let pending = engine.ledger().pending_alerts();
    assert_eq!(
        pending.get("collector_milestone").map(String::as_str),
        Some("recipe_created")
    );
}

#[test]
fn session_budget_holds_across_events_in_one_run() {
    let engine = engine_with(Library::new(10, 5));

    engine.report_event("recipe_created", &Metadata::new());
    engine.report_event(
        "favorite_added",
        &Metadata::new().with_bool("is_adding", true),
    );
    engine.report_event(
        "meal_plan_updated",
        &Metadata::new().with_int("planned_days", 5),
    );

    let drained = engine.drain_responses();
    let session_scoped = drained
        .iter()
        .filter(|a| a.payload.is_session_scoped())
        .count();
    assert_eq!(session_scoped, 1);

    // The blocked alerts are all deferred, keyed by their own events.
    let pending = engine.ledger().pending_alerts();
    assert_eq!(
        pending.get("favourites_tour").map(String::as_str),
        Some("favorite_added")
    );
    assert_eq!(
        pending.get("planner_pro").map(String::as_str),
        Some("meal_plan_updated")
    );
}

#[test]
fn threshold_jump_fires_only_lowest_undispatched() {
    // Five rules activate in one call; the count crosses thresholds 2 and 4
    // simultaneously but only 2 may fire this pass.
    let rules: Vec<RuleSpec> = (0..5)
        .map(|i| {
            let key: &'static str = Box::leak(format!("rule_{i}").into_boxed_str());
            RuleSpec::new(key, &["e"], Box::new(|_, _, _, _| Ok(true)))
        })
        .collect();
    let engine = Engine::with_parts(
        Arc::new(InMemoryStateStore::new()),
        Arc::new(Library::new(0, 0)),
        Arc::new(RuleSet::new(
            rules,
            vec![],
            vec![
                (2, "badge_novice"),
                (4, "badge_cook"),
                (6, "badge_chef"),
                (8, "badge_master"),
            ],
        )),
        StageRunner::new(vec![]),
    );

    engine.report_event("e", &Metadata::new());

    let drained = engine.drain_responses();
    let effects: Vec<_> = drained
        .iter()
        .filter_map(|a| match &a.payload {
            ResponsePayload::Effect {
                effect_key,
                threshold,
            } => Some((effect_key.clone(), *threshold)),
            _ => None,
        })
        .collect();
    assert_eq!(effects, vec![("badge_novice".to_string(), Some(2))]);
}

#[test]
fn sharing_streak_counts_across_calls() {
    let engine = engine_with(Library::new(0, 0));

    engine.report_event("recipe_shared", &Metadata::new());
    engine.report_event("recipe_shared", &Metadata::new());
    assert!(engine.drain_responses().is_empty());
    assert!(!engine.ledger().is_activated("sharing_streak"));

    // Third share: counter reaches 3 before the predicate runs.
    engine.report_event("recipe_shared", &Metadata::new());
    let drained = engine.drain_responses();
    assert!(engine.ledger().is_activated("sharing_streak"));
    assert_eq!(drained.len(), 1);
    assert!(matches!(
        drained[0].payload,
        ResponsePayload::Alert { ref alert_id, .. } if alert_id == "sharing_champion"
    ));
}

#[test]
fn app_open_runs_calibration_stages() {
    let engine = engine_with(Library::new(12, 3));

    engine.report_event("app_opened", &Metadata::new());

    let drained = engine.drain_responses();
    assert!(drained
        .iter()
        .any(|a| a.payload.kind() == "system_message"));
    assert!(engine.ledger().stage_complete("library_audit"));
    assert!(engine.ledger().stage_complete("favorites_recount"));
    // No cooked dates in this library; stage 3 stays pending.
    assert!(!engine.ledger().stage_complete("legacy_cooked_dates"));
}

#[test]
fn legacy_cooked_dates_emits_ui_patch() {
    let engine = engine_with(Library {
        recipes: 3,
        favorites: 0,
        cooked: vec!["r1".into(), "r2".into()],
    });

    engine.report_event("app_opened", &Metadata::new());

    let drained = engine.drain_responses();
    assert!(drained.iter().any(|a| matches!(
        &a.payload,
        ResponsePayload::UiPatch { target, value, .. }
            if target == "history_panel" && value == "visible"
    )));
    assert!(engine.ledger().stage_complete("legacy_cooked_dates"));
}

#[test]
fn clear_resets_activation_dispatch_and_counters() {
    let engine = engine_with(Library::new(10, 5));

    engine.report_event("recipe_created", &Metadata::new());
    engine.report_event("recipe_shared", &Metadata::new());
    assert!(engine.ledger().is_activated("first_recipe"));
    assert_eq!(engine.ledger().counter("shares"), 1);

    engine.clear_state();

    assert!(!engine.ledger().is_activated("first_recipe"));
    assert_eq!(engine.ledger().counter("shares"), 0);
    assert!(engine.ledger().pending_alerts().is_empty());
}
