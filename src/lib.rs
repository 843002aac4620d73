//! # Sprig - Embedded Engagement & Calibration Engine
//!
//! Sprig is the hidden engagement layer of a recipe-management application.
//! It listens to semantic usage events, evaluates a fixed table of declarative
//! rules against accumulated usage history, and queues typed "response
//! artifacts" (system messages, UI overrides, navigation hints) that a
//! separate rendering layer drains and acts on.
//!
//! ## Core Concepts
//!
//! - **Event**: a named occurrence reported by the host app, carrying a
//!   loosely-typed metadata bag
//! - **RuleSpec**: a keyed, declaration-ordered predicate over events and
//!   stored/external state; activation is one-time and permanent
//! - **Dispatch**: the at-most-once-ever delivery of an alert/effect id
//! - **Session fire guard**: at most one alert- or effect-class artifact per
//!   process run; blocked alerts are deferred, not dropped
//! - **Migration stage**: an ordered, dependency-gated, idempotent one-time
//!   calibration step sharing the same persistent store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sprig::{Engine, InMemoryStateStore, Metadata};
//!
//! let store = Arc::new(InMemoryStateStore::new());
//! let engine = Engine::new(store, Arc::new(my_data_source));
//!
//! engine.report_event("favorite_added", &Metadata::new().with_bool("is_adding", true));
//! let artifacts = engine.drain_responses();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Model types
pub mod artifact;
pub mod datasource;
pub mod error;
pub mod event;
pub mod metadata;

// Rule table, evaluation, and response derivation
pub mod evaluator;
pub mod responder;
pub mod rules;
pub mod stages;

// Persistence and orchestration
pub mod engine;
pub mod store;

// Re-export primary types at crate root for convenience
pub use artifact::{ResponseArtifact, ResponsePayload, ResponseQueue};
pub use datasource::{ContentKind, ContentPayload, ContentResolver, NullResolver, RecipeDataSource};
pub use engine::Engine;
pub use error::{DataSourceError, EngineError, EngineResult};
pub use evaluator::Evaluator;
pub use metadata::{MetaValue, Metadata};
pub use responder::Responder;
pub use rules::{CounterSpec, RuleSet, RuleSpec};
pub use stages::{calibration_stages, MigrationStage, StageOutcome, StageRunner};
pub use store::{FileStateStore, InMemoryStateStore, Ledger, StateStore};
