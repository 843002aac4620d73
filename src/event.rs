//! Well-known event names reported by the host application.
//!
//! Events are plain strings on the wire; these constants exist so the rule
//! catalog, the stage bodies, and the host report sites agree on spelling.

/// App came to the foreground / finished launching.
pub const APP_OPENED: &str = "app_opened";

/// A recipe was created by hand.
pub const RECIPE_CREATED: &str = "recipe_created";

/// A recipe was imported from an external source.
pub const RECIPE_IMPORTED: &str = "recipe_imported";

/// A recipe detail view was opened.
pub const RECIPE_VIEWED: &str = "recipe_viewed";

/// A recipe was shared out of the app.
pub const RECIPE_SHARED: &str = "recipe_shared";

/// A recipe was favorited or unfavorited (see `is_adding` metadata).
pub const FAVORITE_ADDED: &str = "favorite_added";

/// The meal plan was edited.
pub const MEAL_PLAN_UPDATED: &str = "meal_plan_updated";

/// Hands-free cook mode was entered.
pub const COOK_MODE_ENTERED: &str = "cook_mode_entered";

/// A library search was executed.
pub const SEARCH_PERFORMED: &str = "search_performed";
