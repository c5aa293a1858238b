use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::time::sleep;
use url::Url;

use crate::delivery::{DeliveryOutcome, DeliveryStrategy, StrategyChain};
use crate::error::{ConfigError, DispatchError};
use crate::surface::UiSurface;
use crate::types::{Notification, Payload, SessionState, PLACEHOLDER_ENDPOINT};

#[cfg(feature = "metrics")]
fn metric_inc(name: &'static str) {
    metrics::increment_counter!(name);
}

#[cfg(not(feature = "metrics"))]
fn metric_inc(_name: &'static str) {}

#[cfg(feature = "tracing")]
fn trace_event(message: &'static str) {
    tracing::info!(message);
}

#[cfg(not(feature = "tracing"))]
fn trace_event(_message: &'static str) {}

/// Trigger label while idle.
pub const IDLE_LABEL: &str = "Disparar Mensagens";

/// Trigger label while a dispatch is in flight.
pub const BUSY_LABEL: &str = "Enviando...";

/// Live-region announcement when a dispatch starts.
pub const BUSY_ANNOUNCEMENT: &str = "Enviando mensagens, aguarde...";

/// Live-region announcement once the trigger is usable again.
pub const READY_ANNOUNCEMENT: &str = "Pronto para enviar mensagens";

/// Immutable dispatch configuration, supplied at construction.
/// There is no runtime reconfiguration.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Target webhook URL. Must be an absolute URL and must differ from
    /// [`PLACEHOLDER_ENDPOINT`], or every trigger is refused.
    pub endpoint_url: String,

    /// Abort window for the direct delivery attempt.
    pub request_timeout: Duration,

    /// How long a feedback notification stays visible.
    pub feedback_display: Duration,

    /// Guard window during which repeat triggers are ignored.
    pub debounce: Duration,

    /// CORS-relay prefix the percent-encoded endpoint is appended to.
    /// When absent the chain collapses to direct call + form post.
    pub relay_base: Option<String>,
}

impl DispatcherConfig {
    /// Configuration for an endpoint with the standard timings.
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            ..Self::default()
        }
    }

    /// Set the direct-attempt abort window.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the notification display duration.
    pub fn with_feedback_display(mut self, duration: Duration) -> Self {
        self.feedback_display = duration;
        self
    }

    /// Set the debounce guard window.
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    /// Enable the relay strategy with the given prefix.
    pub fn with_relay_base(mut self, relay_base: impl Into<String>) -> Self {
        self.relay_base = Some(relay_base.into());
        self
    }

    /// Check the endpoint invariant: a well-formed absolute URL that is not
    /// the shipped placeholder.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint_url.is_empty() || self.endpoint_url == PLACEHOLDER_ENDPOINT {
            return Err(ConfigError::PlaceholderUrl);
        }

        Url::parse(&self.endpoint_url).map_err(|_| ConfigError::InvalidUrl {
            url: self.endpoint_url.clone(),
        })?;

        Ok(())
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            endpoint_url: PLACEHOLDER_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(10),
            feedback_display: Duration::from_secs(3),
            debounce: Duration::from_secs(1),
            relay_base: None,
        }
    }
}

/// Hook invoked with a description of any fault the dispatch boundary
/// swallowed. Shell code may wire this to a process-wide handler.
pub type FaultHook = Arc<dyn Fn(&str) + Send + Sync>;

/// The dispatch controller.
///
/// Owns the session state, sequences validation → delivery → feedback, and
/// guarantees the trigger never remains stuck busy. One instance per hosting
/// page or process; it is not a queue, and a refused trigger is simply gone.
pub struct Dispatcher {
    config: DispatcherConfig,
    chain: StrategyChain,
    surface: Arc<dyn UiSurface>,
    state: SessionState,
    fault_hook: Option<FaultHook>,
}

impl Dispatcher {
    /// Build a controller with the standard strategy chain for the
    /// configured endpoint.
    pub fn new(config: DispatcherConfig, surface: Arc<dyn UiSurface>) -> Self {
        let chain =
            StrategyChain::for_endpoint(&config.endpoint_url, config.relay_base.as_deref());
        Self {
            config,
            chain,
            surface,
            state: SessionState::new(),
            fault_hook: None,
        }
    }

    /// Replace the delivery chain with an explicit strategy list.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn DeliveryStrategy>>) -> Self {
        self.chain = StrategyChain::new(strategies);
        self
    }

    /// Install the unhandled-fault hook.
    pub fn with_fault_hook(mut self, hook: FaultHook) -> Self {
        self.fault_hook = Some(hook);
        self
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Whether a dispatch sequence is currently in flight.
    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Whether the debounce window of a prior trigger is still open.
    pub fn is_debounced(&self) -> bool {
        self.state.is_debounced()
    }

    /// Wall-clock time of the last accepted trigger.
    pub fn last_dispatch_at(&self) -> Option<std::time::SystemTime> {
        self.state.last_dispatch_at()
    }

    /// Run one guarded dispatch: validate, deliver through the fallback
    /// chain, report success, restore the trigger.
    ///
    /// Refusals (`Busy`, `Debounced`, `InvalidConfig`) produce no delivery
    /// attempt. Once delivery starts, the result is always a success
    /// notification and an `accepted` outcome; transport failures and even
    /// panics inside the sequence are absorbed. That is the fire-and-forget
    /// contract: the caller only learns that an attempt was dispatched,
    /// never whether the remote system acknowledged it.
    pub async fn trigger_dispatch(&self) -> Result<DeliveryOutcome, DispatchError> {
        if self.state.is_loading() {
            trace_event("webhook_trigger.ignored.loading");
            metric_inc("webhook_trigger.ignored.loading");
            return Err(DispatchError::Busy);
        }

        if !self.state.try_claim_debounce() {
            trace_event("webhook_trigger.ignored.debounced");
            metric_inc("webhook_trigger.ignored.debounced");
            return Err(DispatchError::Debounced);
        }
        self.arm_debounce_clear();

        if let Err(err) = self.config.validate() {
            metric_inc("webhook_trigger.config.invalid");
            self.notify(Notification::config_required());
            return Err(DispatchError::InvalidConfig(err));
        }

        self.state.mark_dispatched();

        let sequence = async {
            self.begin_busy();
            let payload = Payload::new();
            let outcome = self
                .chain
                .deliver(&payload, self.config.request_timeout)
                .await;
            self.notify(Notification::success());
            outcome
        };

        let outcome = match AssertUnwindSafe(sequence).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                self.report_fault(&panic_message(panic));
                // The user is still owed the success feedback.
                let _ = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    self.notify(Notification::success());
                }));
                DeliveryOutcome {
                    accepted: true,
                    via: None,
                }
            }
        };

        self.finalize();
        metric_inc("webhook_trigger.dispatch.completed");
        Ok(outcome)
    }

    fn begin_busy(&self) {
        self.state.set_loading(true);
        self.surface.set_trigger_enabled(false);
        self.surface.set_trigger_label(BUSY_LABEL);
        self.surface.announce(BUSY_ANNOUNCEMENT);
    }

    /// Runs on every busy exit path. The loading flag is cleared first so it
    /// cannot stick even when the surface misbehaves.
    fn finalize(&self) {
        self.state.set_loading(false);

        let restored = std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.surface.set_trigger_enabled(true);
            self.surface.set_trigger_label(IDLE_LABEL);
            self.surface.announce(READY_ANNOUNCEMENT);
        }));

        if restored.is_err() {
            self.report_fault("surface restore failed");
            let _ = std::panic::catch_unwind(AssertUnwindSafe(|| {
                self.surface.set_trigger_enabled(true);
            }));
        }
    }

    /// Show a notification and schedule its dismissal. The timer is detached
    /// and runs to completion unconditionally.
    fn notify(&self, notification: Notification) {
        self.surface.show_notification(&notification);

        let surface = Arc::clone(&self.surface);
        let display = self.config.feedback_display;
        tokio::spawn(async move {
            sleep(display).await;
            surface.hide_notification();
        });
    }

    /// One-shot timer clearing the debounce flag. Not cancellable by
    /// further triggers.
    fn arm_debounce_clear(&self) {
        let flag = self.state.debounce_flag();
        let window = self.config.debounce;
        tokio::spawn(async move {
            sleep(window).await;
            flag.store(false, Ordering::SeqCst);
        });
    }

    fn report_fault(&self, message: &str) {
        trace_event("webhook_trigger.fault");
        metric_inc("webhook_trigger.fault");
        if let Some(hook) = &self.fault_hook {
            hook(message);
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unhandled fault in dispatch sequence".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_refused_as_placeholder() {
        let config = DispatcherConfig::default();
        assert_eq!(config.validate(), Err(ConfigError::PlaceholderUrl));
    }

    #[test]
    fn placeholder_endpoint_is_refused() {
        let config = DispatcherConfig::new(PLACEHOLDER_ENDPOINT);
        assert_eq!(config.validate(), Err(ConfigError::PlaceholderUrl));
    }

    #[test]
    fn malformed_endpoint_is_refused() {
        let config = DispatcherConfig::new("not a url");
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidUrl {
                url: "not a url".to_string()
            })
        );
    }

    #[test]
    fn relative_endpoint_is_refused() {
        let config = DispatcherConfig::new("/webhook/dispatch");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn absolute_endpoint_is_accepted() {
        let config = DispatcherConfig::new("https://hooks.example/dispatch");
        assert_eq!(config.validate(), Ok(()));
    }
}
