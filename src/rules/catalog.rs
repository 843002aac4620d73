//! The production rule catalog for the recipe application.
//!
//! Declaration order matters: when one event activates several rules, the
//! earliest declared rule's alert is the one that fires this session.

use crate::event;
use crate::rules::{CounterSpec, RuleSet, RuleSpec};

/// Counter names.
pub mod counters {
    /// Incremented on every `recipe_shared`.
    pub const SHARES: &str = "shares";
    /// Incremented on every `cook_mode_entered`.
    pub const COOK_SESSIONS: &str = "cook_sessions";
    /// Incremented on every `app_opened`.
    pub const APP_OPENS: &str = "app_opens";
}

/// Builds the static production rule table.
#[must_use]
pub fn catalog() -> RuleSet {
    let rules = vec![
        // The very first hand-made recipe.
        RuleSpec::new(
            "first_recipe",
            &[event::RECIPE_CREATED],
            Box::new(|_, _, _, _| Ok(true)),
        )
        .with_alert("welcome_chef"),
        // Library grew to a real collection.
        RuleSpec::new(
            "recipe_collector",
            &[event::RECIPE_CREATED, event::RECIPE_IMPORTED],
            Box::new(|_, _, source, _| Ok(source.recipe_count()? >= 10)),
        )
        .with_alert("collector_milestone"),
        // Favoriting is being used in breadth, not as a one-off.
        RuleSpec::new(
            "favourite_breadth",
            &[event::FAVORITE_ADDED],
            Box::new(|_, metadata, source, _| {
                if !metadata.bool_or("is_adding", false) {
                    return Ok(false);
                }
                Ok(source.favorite_count()? >= 5)
            }),
        )
        .with_alert("favourites_tour"),
        // Plans at least three days ahead in one edit.
        RuleSpec::new(
            "planner_habit",
            &[event::MEAL_PLAN_UPDATED],
            Box::new(|_, metadata, _, _| Ok(metadata.int_or("planned_days", 0) >= 3)),
        )
        .with_alert("planner_pro"),
        // Third share overall. Counter is bumped before predicates run.
        RuleSpec::new(
            "sharing_streak",
            &[event::RECIPE_SHARED],
            Box::new(|_, _, _, ledger| Ok(ledger.counter(counters::SHARES) >= 3)),
        )
        .with_alert("sharing_champion"),
        // Regular cook-mode user.
        RuleSpec::new(
            "cook_mode_regular",
            &[event::COOK_MODE_ENTERED],
            Box::new(|_, _, _, ledger| Ok(ledger.counter(counters::COOK_SESSIONS) >= 5)),
        )
        .with_breadcrumb("cook_mode_tips"),
        // Keeps coming back. No alert; feeds the effect thresholds.
        RuleSpec::new(
            "returning_user",
            &[event::APP_OPENED],
            Box::new(|_, _, _, ledger| Ok(ledger.counter(counters::APP_OPENS) >= 10)),
        ),
        // Searches against a library big enough to need it.
        RuleSpec::new(
            "power_searcher",
            &[event::SEARCH_PERFORMED],
            Box::new(|_, metadata, _, _| Ok(metadata.int_or("result_count", 0) >= 20)),
        ),
    ];

    let counter_specs = vec![
        CounterSpec {
            event: event::RECIPE_SHARED,
            counter: counters::SHARES,
        },
        CounterSpec {
            event: event::COOK_MODE_ENTERED,
            counter: counters::COOK_SESSIONS,
        },
        CounterSpec {
            event: event::APP_OPENED,
            counter: counters::APP_OPENS,
        },
    ];

    let effect_thresholds = vec![
        (2, "badge_novice"),
        (4, "badge_cook"),
        (6, "badge_chef"),
        (8, "badge_master"),
    ];

    RuleSet::new(rules, counter_specs, effect_thresholds)
}
