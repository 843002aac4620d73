//! External collaborator interfaces.
//!
//! The engine never owns domain data or renderable content; it queries both
//! through these injected trait objects. Production implementations live in
//! the host application, test fakes live next to the tests that use them.

use crate::error::DataSourceError;

/// Read-only aggregate queries over the host's recipe repositories.
///
/// Predicates and stages treat any `Err` as "condition not met" for the
/// current event; the engine never retries or propagates these failures.
pub trait RecipeDataSource: Send + Sync {
    /// Total number of recipes in the library.
    fn recipe_count(&self) -> Result<i64, DataSourceError>;

    /// Number of recipes currently marked favorite.
    fn favorite_count(&self) -> Result<i64, DataSourceError>;

    /// Number of meal-plan entries across all planned days.
    fn planned_meal_count(&self) -> Result<i64, DataSourceError>;

    /// Ids of recipes carrying a non-empty "last cooked" date.
    fn recipes_with_cooked_date(&self) -> Result<Vec<String>, DataSourceError>;
}

/// Identifier namespace handed to the content resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// Alert dialog content.
    Alert,
    /// Breadcrumb/effect content.
    Effect,
    /// System message text.
    Message,
}

/// Renderable payload returned by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPayload {
    /// Plain display text.
    Text(String),
    /// A UI-patch instruction encoded as (target, value).
    Patch(String, String),
}

/// Maps opaque alert/effect/message ids to renderable payloads.
///
/// Resolution failure (`None`) means the artifact is simply not rendered;
/// engine state is unaffected either way.
pub trait ContentResolver: Send + Sync {
    /// Resolves an identifier within a namespace.
    fn resolve(&self, kind: ContentKind, id: &str) -> Option<ContentPayload>;
}

/// Resolver that resolves nothing.
///
/// Default for hosts that have not wired a content catalog yet; stages fall
/// back to their built-in copy.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

impl ContentResolver for NullResolver {
    fn resolve(&self, _kind: ContentKind, _id: &str) -> Option<ContentPayload> {
        None
    }
}
