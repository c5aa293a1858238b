use std::fmt;

/// Errors returned when a trigger is refused *before* delivery begins.
///
/// Delivery itself never fails from the caller's perspective; see
/// [`crate::StrategyChain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// A dispatch is already in flight.
    /// The trigger is silently ignored; no retry is queued.
    Busy,

    /// The debounce window of a prior trigger is still open.
    Debounced,

    /// The configured endpoint is unusable.
    /// The only refusal that is surfaced to the user.
    InvalidConfig(ConfigError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Busy =>
                write!(f, "dispatch already in flight"),
            DispatchError::Debounced =>
                write!(f, "trigger inside debounce window"),
            DispatchError::InvalidConfig(err) =>
                write!(f, "configuration invalid: {}", err),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Reasons the endpoint configuration was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The endpoint URL is still the shipped placeholder.
    PlaceholderUrl,

    /// The endpoint URL does not parse as an absolute URL.
    InvalidUrl {
        url: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::PlaceholderUrl =>
                write!(f, "endpoint URL is not configured"),
            ConfigError::InvalidUrl { url } =>
                write!(f, "endpoint URL does not parse: {}", url),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Reasons a single strategy attempt was rejected at the transport level.
///
/// These never reach the user; the next strategy in the chain absorbs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Timeout,
    Network,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Timeout =>
                write!(f, "request timed out"),
            FailureReason::Network =>
                write!(f, "network error"),
        }
    }
}
