//! Error types for sprig.
//!
//! All errors are strongly typed using thiserror. Nothing in this crate is
//! fatal to the host process: predicate and stage failures are logged and
//! degrade to "no artifact produced", and the state store never surfaces
//! errors through its trait at all.

use thiserror::Error;

/// Errors surfaced by the injected read-only data source.
///
/// The engine never propagates these to its caller; a failing query makes
/// the affected predicate evaluate to `false` for that event.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("Data source unavailable: {message}")]
    Unavailable {
        message: String,
    },

    #[error("Query failed: {query}: {message}")]
    QueryFailed {
        query: String,
        message: String,
    },
}

/// Internal errors raised while the file-backed store reads or writes its
/// snapshot. These never cross the [`StateStore`](crate::StateStore) trait
/// surface; the backend logs them and falls back to defaults.
#[derive(Debug, Error)]
pub enum StoreIoError {
    #[error("Snapshot I/O failed at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot corrupt at {path}: {message}")]
    Corrupt {
        path: String,
        message: String,
    },
}

/// Top-level error type for rule and stage evaluation.
///
/// Used only for diagnostics: `report_event` swallows every variant after
/// logging it, per the fire-and-forget ingress contract.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),

    #[error("Predicate '{rule_key}' failed: {message}")]
    PredicateFailed {
        rule_key: String,
        message: String,
    },

    #[error("Stage '{stage_key}' failed: {message}")]
    StageFailed {
        stage_key: String,
        message: String,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl EngineError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error originated in the injected data source.
    #[must_use]
    pub const fn is_data_source(&self) -> bool {
        matches!(self, Self::DataSource(_))
    }
}

/// Result type alias for sprig evaluation paths.
pub type EngineResult<T> = Result<T, EngineError>;
