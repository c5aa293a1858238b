use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Shipped placeholder endpoint. Dispatch is refused until it is replaced.
pub const PLACEHOLDER_ENDPOINT: &str =
    "https://your-n8n-instance.com/webhook/whatsapp-dispatcher";

/// Action field carried by every dispatch payload.
pub const DISPATCH_ACTION: &str = "dispatch_messages";

/// Source field carried by every dispatch payload. The receiving automation
/// may key on this value, so it is stable across versions.
pub const PAYLOAD_SOURCE: &str = "whatsapp-dispatcher-web";

/// Body of one outbound webhook call.
///
/// Constructed fresh per attempt, never reused or cached. The payload is
/// content-free on purpose: it announces *that* a dispatch was requested,
/// not *what* to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    /// Fixed action discriminator for the receiving automation.
    pub action: String,

    /// RFC 3339 timestamp taken at construction.
    pub timestamp: String,

    /// Stable identifier of the dispatching application.
    pub source: String,

    /// Free-form description of the dispatching client, the user-agent
    /// analogue.
    pub client_context: String,
}

impl Payload {
    /// Create a payload stamped with the current time.
    pub fn new() -> Self {
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();

        Self {
            action: DISPATCH_ACTION.to_string(),
            timestamp,
            source: PAYLOAD_SOURCE.to_string(),
            client_context: default_client_context(),
        }
    }

    /// Override the source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Override the client context string.
    pub fn with_client_context(mut self, context: impl Into<String>) -> Self {
        self.client_context = context.into();
        self
    }

    /// Flatten the payload into form fields for a traditional form post.
    ///
    /// Non-scalar values are serialized to JSON strings so every field stays
    /// a flat key/value pair on the wire.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map
                .into_iter()
                .map(|(key, value)| {
                    let value = match value {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (key, value)
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::new()
    }
}

fn default_client_context() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Kind of a user-facing feedback notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient feedback shown after a trigger, auto-dismissed by the
/// controller. No backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub kind: NotificationKind,
}

impl Notification {
    /// The canonical fire-and-forget success feedback.
    pub fn success() -> Self {
        Self {
            title: "Sucesso!".to_string(),
            kind: NotificationKind::Success,
        }
    }

    /// Shown when the endpoint URL is missing or malformed.
    pub fn config_required() -> Self {
        Self {
            title: "Configuração necessária".to_string(),
            kind: NotificationKind::Error,
        }
    }
}

/// Mutable per-controller dispatch state.
///
/// One instance per [`crate::Dispatcher`], created at construction and
/// mutated only by the dispatch lifecycle. The flags are atomics because
/// delivery runs on a multi-threaded runtime; concurrent triggers serialize
/// through them, not through a queue.
#[derive(Debug, Default)]
pub struct SessionState {
    is_loading: AtomicBool,
    is_debounced: Arc<AtomicBool>,
    last_dispatch_at: Mutex<Option<SystemTime>>,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Whether a dispatch sequence is currently in flight.
    pub fn is_loading(&self) -> bool {
        self.is_loading.load(Ordering::SeqCst)
    }

    pub(crate) fn set_loading(&self, loading: bool) {
        self.is_loading.store(loading, Ordering::SeqCst);
    }

    /// Whether the debounce window of a prior trigger is still open.
    pub fn is_debounced(&self) -> bool {
        self.is_debounced.load(Ordering::SeqCst)
    }

    /// Claim the debounce flag. Returns false if another trigger holds it.
    pub(crate) fn try_claim_debounce(&self) -> bool {
        !self.is_debounced.swap(true, Ordering::SeqCst)
    }

    /// Handle for the one-shot timer that clears the debounce window.
    pub(crate) fn debounce_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.is_debounced)
    }

    pub(crate) fn mark_dispatched(&self) {
        let mut guard = self.last_dispatch_at.lock().expect("lock");
        *guard = Some(SystemTime::now());
    }

    /// Wall-clock time of the last accepted trigger, if any.
    pub fn last_dispatch_at(&self) -> Option<SystemTime> {
        *self.last_dispatch_at.lock().expect("lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_fixed_action_and_source() {
        let payload = Payload::new();
        assert_eq!(payload.action, DISPATCH_ACTION);
        assert_eq!(payload.source, PAYLOAD_SOURCE);
        assert!(!payload.timestamp.is_empty());
        assert!(payload.client_context.starts_with("webhook-trigger/"));
    }

    #[test]
    fn payload_serializes_client_context_in_camel_case() {
        let json = serde_json::to_value(Payload::new()).expect("serialize");
        assert!(json.get("clientContext").is_some());
        assert!(json.get("client_context").is_none());
    }

    #[test]
    fn form_fields_flatten_to_plain_strings() {
        let payload = Payload::new()
            .with_source("test-suite")
            .with_client_context("tests/1.0");
        let fields = payload.form_fields();

        let action = ("action".to_string(), DISPATCH_ACTION.to_string());
        let source = ("source".to_string(), "test-suite".to_string());
        let context = ("clientContext".to_string(), "tests/1.0".to_string());
        assert!(fields.contains(&action));
        assert!(fields.contains(&source));
        assert!(fields.contains(&context));
        assert_eq!(fields.len(), 4);
    }

    #[test]
    fn debounce_flag_is_claimed_once() {
        let state = SessionState::new();
        assert!(!state.is_debounced());
        assert!(state.try_claim_debounce());
        assert!(state.is_debounced());
        assert!(!state.try_claim_debounce());

        state.debounce_flag().store(false, Ordering::SeqCst);
        assert!(state.try_claim_debounce());
    }

    #[test]
    fn mark_dispatched_records_a_timestamp() {
        let state = SessionState::new();
        assert!(state.last_dispatch_at().is_none());
        state.mark_dispatched();
        assert!(state.last_dispatch_at().is_some());
    }
}
