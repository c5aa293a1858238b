use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(not(feature = "http"))]
use tokio::time::sleep;

use crate::error::FailureReason;
use crate::types::Payload;

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

#[cfg(not(feature = "http"))]
const SIMULATED_LATENCY: Duration = Duration::from_millis(25);

/// One concrete mechanism for transmitting the payload to the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Cross-origin JSON POST straight at the endpoint.
    Direct,
    /// JSON POST routed through a CORS-bridging relay.
    Relay,
    /// Traditional form post of the flattened payload.
    FormPost,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Direct => write!(f, "direct"),
            StrategyKind::Relay => write!(f, "relay"),
            StrategyKind::FormPost => write!(f, "form-post"),
        }
    }
}

/// Final outcome of running the strategy chain once.
///
/// With the form post in the chain, `accepted` is `true` on every path: the
/// form post swallows all transport errors. That degenerate guarantee is the
/// point of the fire-and-forget contract, not an oversight. `accepted ==
/// false` can only be observed on a custom chain built without an infallible
/// tail strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Whether any strategy accepted the payload.
    pub accepted: bool,

    /// The strategy that accepted, when one did.
    pub via: Option<StrategyKind>,
}

/// A single delivery mechanism. Exactly one outbound attempt per call.
#[async_trait]
pub trait DeliveryStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Transmit the payload. `Err` means a transport-level rejection that
    /// the next strategy in the chain should absorb; any HTTP status counts
    /// as acceptance.
    async fn attempt(&self, payload: &Payload, timeout: Duration) -> Result<(), FailureReason>;
}

/// Direct cross-origin JSON POST with an abortable per-request timeout.
///
/// A timeout here counts as accepted: the request left the client, and the
/// remote system is assumed to still receive the already-sent bytes.
#[cfg_attr(not(feature = "http"), allow(dead_code))]
pub struct DirectStrategy {
    #[cfg(feature = "http")]
    client: reqwest::Client,
    endpoint_url: String,
}

impl DirectStrategy {
    pub fn new(
        #[cfg(feature = "http")] client: reqwest::Client,
        endpoint_url: impl Into<String>,
    ) -> Self {
        Self {
            #[cfg(feature = "http")]
            client,
            endpoint_url: endpoint_url.into(),
        }
    }
}

#[async_trait]
impl DeliveryStrategy for DirectStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Direct
    }

    async fn attempt(&self, payload: &Payload, timeout: Duration) -> Result<(), FailureReason> {
        #[cfg(feature = "http")]
        {
            let response = self
                .client
                .post(&self.endpoint_url)
                .timeout(timeout)
                .header(reqwest::header::ACCEPT, "application/json")
                .json(payload)
                .send()
                .await;

            return match response {
                // Any status, 4xx/5xx included, counts as accepted.
                Ok(_) => Ok(()),
                // Abort-as-delivered: the bytes are assumed sent.
                Err(err) if err.is_timeout() => Ok(()),
                Err(_) => Err(FailureReason::Network),
            };
        }

        #[cfg(not(feature = "http"))]
        {
            let _ = payload;
            sleep(SIMULATED_LATENCY.min(timeout)).await;
            Ok(())
        }
    }
}

/// JSON POST through a public CORS-bridging relay wrapping the endpoint.
///
/// Unlike the direct call, a relay timeout is a transport rejection: nothing
/// guarantees the relay forwarded anything, so the chain falls through.
#[cfg_attr(not(feature = "http"), allow(dead_code))]
pub struct RelayStrategy {
    #[cfg(feature = "http")]
    client: reqwest::Client,
    target: String,
}

impl RelayStrategy {
    /// `relay_base` is the relay prefix the percent-encoded endpoint URL is
    /// appended to, e.g. `https://relay.example/raw?url=`.
    pub fn new(
        #[cfg(feature = "http")] client: reqwest::Client,
        relay_base: impl Into<String>,
        endpoint_url: &str,
    ) -> Self {
        let encoded: String =
            url::form_urlencoded::byte_serialize(endpoint_url.as_bytes()).collect();
        Self {
            #[cfg(feature = "http")]
            client,
            target: format!("{}{}", relay_base.into(), encoded),
        }
    }
}

#[async_trait]
impl DeliveryStrategy for RelayStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Relay
    }

    async fn attempt(&self, payload: &Payload, timeout: Duration) -> Result<(), FailureReason> {
        #[cfg(feature = "http")]
        {
            let response = self
                .client
                .post(&self.target)
                .timeout(timeout)
                .header("X-Requested-With", "XMLHttpRequest")
                .json(payload)
                .send()
                .await;

            return match response {
                Ok(_) => Ok(()),
                Err(err) if err.is_timeout() => Err(FailureReason::Timeout),
                Err(_) => Err(FailureReason::Network),
            };
        }

        #[cfg(not(feature = "http"))]
        {
            let _ = payload;
            sleep(SIMULATED_LATENCY.min(timeout)).await;
            Ok(())
        }
    }
}

/// Form-encoded POST of the flattened payload, response never read.
///
/// The delivery mechanism of last resort: it exposes no outcome to observe,
/// so it cannot fail from the caller's perspective.
#[cfg_attr(not(feature = "http"), allow(dead_code))]
pub struct FormPostStrategy {
    #[cfg(feature = "http")]
    client: reqwest::Client,
    endpoint_url: String,
}

impl FormPostStrategy {
    pub fn new(
        #[cfg(feature = "http")] client: reqwest::Client,
        endpoint_url: impl Into<String>,
    ) -> Self {
        Self {
            #[cfg(feature = "http")]
            client,
            endpoint_url: endpoint_url.into(),
        }
    }
}

#[async_trait]
impl DeliveryStrategy for FormPostStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FormPost
    }

    async fn attempt(&self, payload: &Payload, timeout: Duration) -> Result<(), FailureReason> {
        #[cfg(feature = "http")]
        {
            let _ = self
                .client
                .post(&self.endpoint_url)
                .timeout(timeout)
                .form(&payload.form_fields())
                .send()
                .await;
        }

        #[cfg(not(feature = "http"))]
        let _ = (payload, timeout);

        Ok(())
    }
}

/// Ordered list of delivery strategies, iterated until one accepts.
pub struct StrategyChain {
    strategies: Vec<Box<dyn DeliveryStrategy>>,
}

impl StrategyChain {
    /// Build a chain from an explicit strategy list.
    pub fn new(strategies: Vec<Box<dyn DeliveryStrategy>>) -> Self {
        Self { strategies }
    }

    /// The standard chain for an endpoint: direct call, then the relay when
    /// one is configured, then the form post.
    pub fn for_endpoint(endpoint_url: &str, relay_base: Option<&str>) -> Self {
        #[cfg(feature = "http")]
        let client = reqwest::Client::new();

        let mut strategies: Vec<Box<dyn DeliveryStrategy>> = Vec::new();

        strategies.push(Box::new(DirectStrategy::new(
            #[cfg(feature = "http")]
            client.clone(),
            endpoint_url,
        )));

        if let Some(base) = relay_base {
            strategies.push(Box::new(RelayStrategy::new(
                #[cfg(feature = "http")]
                client.clone(),
                base,
                endpoint_url,
            )));
        }

        strategies.push(Box::new(FormPostStrategy::new(
            #[cfg(feature = "http")]
            client,
            endpoint_url,
        )));

        Self { strategies }
    }

    /// Run the chain once. The first strategy that does not reject wins; no
    /// retries beyond the fallback sequence.
    pub async fn deliver(&self, payload: &Payload, timeout: Duration) -> DeliveryOutcome {
        for strategy in &self.strategies {
            match strategy.attempt(payload, timeout).await {
                Ok(()) => {
                    metric_inc("webhook_trigger.delivery.accepted");
                    trace_event("webhook_trigger.delivery.accepted");
                    return DeliveryOutcome {
                        accepted: true,
                        via: Some(strategy.kind()),
                    };
                }
                Err(_) => {
                    metric_inc("webhook_trigger.delivery.fallback");
                    trace_event("webhook_trigger.delivery.fallback");
                }
            }
        }

        metric_inc("webhook_trigger.delivery.exhausted");
        DeliveryOutcome {
            accepted: false,
            via: None,
        }
    }
}
