//! Persistent state storage.
//!
//! The engine keeps all durable state (activation ledger, dispatch ledgers,
//! counters, pending alerts, stage flags) in a small namespaced key/value
//! store behind the [`StateStore`] trait. Two backends are provided: an
//! in-memory store for tests and embedded use, and a JSON-snapshot file
//! store that survives process restarts.

pub mod file;
pub mod keys;
pub mod ledger;
pub mod memory;
pub mod traits;

pub use file::FileStateStore;
pub use keys::DispatchClass;
pub use ledger::Ledger;
pub use memory::InMemoryStateStore;
pub use traits::{StateStore, StoredValue};
