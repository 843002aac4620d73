//! Response artifacts and the in-memory response queue.
//!
//! Artifacts are ephemeral, typed instructions for the rendering layer. They
//! are never persisted; anything queued but not drained before process exit
//! is lost by design (durable obligations live in the store's ledgers, not
//! here).

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Typed payload of a response artifact.
///
/// One variant per renderable instruction class the host understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    /// Transient user-visible message (snackbar class).
    SystemMessage {
        /// Message text, already resolved to a displayable string.
        text: String,
        /// Optional display duration.
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_seconds: Option<u32>,
    },

    /// One-shot alert dialog, resolved externally by alert id.
    Alert {
        /// Identifier handed to the content resolver.
        alert_id: String,
        /// Key of the rule whose activation produced this alert.
        spec_key: String,
    },

    /// Threshold-crossing effect (breadcrumb class).
    Effect {
        /// Identifier handed to the content resolver.
        effect_key: String,
        /// Activation-count threshold that was crossed.
        #[serde(skip_serializing_if = "Option::is_none")]
        threshold: Option<u32>,
    },

    /// Targeted UI state override.
    UiPatch {
        /// UI element or setting to patch.
        target: String,
        /// New value.
        value: String,
        /// Remaining times this patch should apply before expiring.
        #[serde(skip_serializing_if = "Option::is_none")]
        uses_remaining: Option<u32>,
    },

    /// View-level adjustment hint.
    ViewAdjustment {
        /// Adjustment identifier.
        id: String,
        /// Apply only once.
        #[serde(skip_serializing_if = "Option::is_none")]
        once: Option<bool>,
        /// Optional value parameter.
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        /// Optional use budget.
        #[serde(skip_serializing_if = "Option::is_none")]
        uses: Option<u32>,
    },

    /// App-configuration mutation request.
    ConfigUpdate {
        /// Configuration key.
        key: String,
        /// New value.
        value: String,
    },

    /// Request to navigate to a screen.
    NavigationRequest {
        /// Destination screen identifier.
        screen: String,
    },
}

impl ResponsePayload {
    /// Short class name, used in debug strings and tests.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SystemMessage { .. } => "system_message",
            Self::Alert { .. } => "alert",
            Self::Effect { .. } => "effect",
            Self::UiPatch { .. } => "ui_patch",
            Self::ViewAdjustment { .. } => "view_adjustment",
            Self::ConfigUpdate { .. } => "config_update",
            Self::NavigationRequest { .. } => "navigation_request",
        }
    }

    /// Returns true for the artifact classes limited by the session fire
    /// guard (alerts and effects).
    #[must_use]
    pub const fn is_session_scoped(&self) -> bool {
        matches!(self, Self::Alert { .. } | Self::Effect { .. })
    }
}

impl fmt::Display for ResponsePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SystemMessage { text, .. } => write!(f, "system_message({text:?})"),
            Self::Alert { alert_id, spec_key } => write!(f, "alert({alert_id}, rule={spec_key})"),
            Self::Effect {
                effect_key,
                threshold,
            } => match threshold {
                Some(t) => write!(f, "effect({effect_key}, threshold={t})"),
                None => write!(f, "effect({effect_key})"),
            },
            Self::UiPatch { target, value, .. } => write!(f, "ui_patch({target}={value})"),
            Self::ViewAdjustment { id, .. } => write!(f, "view_adjustment({id})"),
            Self::ConfigUpdate { key, value } => write!(f, "config_update({key}={value})"),
            Self::NavigationRequest { screen } => write!(f, "navigation_request({screen})"),
        }
    }
}

/// A queued response artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseArtifact {
    /// The typed instruction.
    pub payload: ResponsePayload,

    /// Optional provenance note for logs and developer tooling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

impl ResponseArtifact {
    /// Wraps a payload with no debug note.
    #[must_use]
    pub const fn new(payload: ResponsePayload) -> Self {
        Self {
            payload,
            debug: None,
        }
    }

    /// Attaches a provenance note.
    #[must_use]
    pub fn with_debug(mut self, note: impl Into<String>) -> Self {
        self.debug = Some(note.into());
        self
    }
}

impl From<ResponsePayload> for ResponseArtifact {
    fn from(payload: ResponsePayload) -> Self {
        Self::new(payload)
    }
}

/// In-memory FIFO of response artifacts.
///
/// Filled by the engine during `report_event`, drained destructively by the
/// rendering layer. Draining is exactly-once per call: two consecutive drains
/// with no intervening event return `[]` on the second.
#[derive(Debug, Default)]
pub struct ResponseQueue {
    items: Mutex<Vec<ResponseArtifact>>,
}

impl ResponseQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one artifact.
    pub fn push(&self, artifact: ResponseArtifact) {
        if let Ok(mut items) = self.items.lock() {
            items.push(artifact);
        }
    }

    /// Appends a batch, preserving order.
    pub fn extend(&self, artifacts: impl IntoIterator<Item = ResponseArtifact>) {
        if let Ok(mut items) = self.items.lock() {
            items.extend(artifacts);
        }
    }

    /// Atomically copies out and clears the queue.
    #[must_use]
    pub fn drain(&self) -> Vec<ResponseArtifact> {
        self.items
            .lock()
            .map(|mut items| std::mem::take(&mut *items))
            .unwrap_or_default()
    }

    /// Current queue depth (diagnostics only).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_kind() {
        let alert = ResponsePayload::Alert {
            alert_id: "welcome_chef".into(),
            spec_key: "first_recipe".into(),
        };
        assert_eq!(alert.kind(), "alert");
        assert!(alert.is_session_scoped());

        let message = ResponsePayload::SystemMessage {
            text: "library calibrated".into(),
            duration_seconds: Some(4),
        };
        assert_eq!(message.kind(), "system_message");
        assert!(!message.is_session_scoped());
    }

    #[test]
    fn test_payload_display() {
        let effect = ResponsePayload::Effect {
            effect_key: "badge_novice".into(),
            threshold: Some(2),
        };
        let display = format!("{effect}");
        assert!(display.contains("badge_novice"));
        assert!(display.contains("threshold=2"));
    }

    #[test]
    fn test_payload_serialization_tag() {
        let patch = ResponsePayload::UiPatch {
            target: "history_panel".into(),
            value: "visible".into(),
            uses_remaining: None,
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert!(json.contains("\"type\":\"ui_patch\""));
        // Skipped optional fields stay off the wire.
        assert!(!json.contains("uses_remaining"));

        let back: ResponsePayload = serde_json::from_str(&json).unwrap();
        assert_eq!(patch, back);
    }

    #[test]
    fn test_artifact_debug_note() {
        let artifact = ResponseArtifact::new(ResponsePayload::NavigationRequest {
            screen: "meal_plan".into(),
        })
        .with_debug("stage:library_audit");
        assert_eq!(artifact.debug.as_deref(), Some("stage:library_audit"));
    }

    #[test]
    fn test_queue_fifo_order() {
        let queue = ResponseQueue::new();
        queue.push(ResponsePayload::NavigationRequest { screen: "a".into() }.into());
        queue.push(ResponsePayload::NavigationRequest { screen: "b".into() }.into());

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(
            drained[0].payload,
            ResponsePayload::NavigationRequest { screen: "a".into() }
        );
    }

    #[test]
    fn test_queue_drain_is_destructive() {
        let queue = ResponseQueue::new();
        queue.push(ResponsePayload::NavigationRequest { screen: "a".into() }.into());

        assert_eq!(queue.drain().len(), 1);
        assert!(queue.drain().is_empty());
        assert!(queue.is_empty());
    }
}
