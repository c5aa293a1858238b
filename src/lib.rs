//! A fire-and-forget webhook trigger.
//!
//! This crate provides the **dispatch-and-feedback state machine** behind a
//! single "send it" control: guarded triggering, an abortable request
//! lifecycle, and a layered delivery fallback chain against one fixed
//! external webhook endpoint.
//!
//! ## Guarantees
//! - At most one dispatch in flight per controller
//! - Repeat triggers inside the debounce window are ignored
//! - The trigger is always restored, whatever delivery does
//! - Once delivery starts, the user sees success
//!
//! ## Non-Guarantees
//! - Confirmed remote acceptance
//! - Retries beyond the fallback sequence
//! - Response interpretation of any kind
//! - Persistence of dispatch history
//!
//! The "user sees success" guarantee is deliberate: the remote automation is
//! assumed best-effort and idempotent, and the caller only cares that an
//! attempt was dispatched. Treat it as UX policy, not as a delivery
//! confirmation.

mod dispatcher;
mod delivery;
mod types;
mod error;
mod surface;

pub use dispatcher::{
    Dispatcher,
    DispatcherConfig,
    FaultHook,
    BUSY_ANNOUNCEMENT,
    BUSY_LABEL,
    IDLE_LABEL,
    READY_ANNOUNCEMENT,
};
pub use delivery::{
    DeliveryOutcome,
    DeliveryStrategy,
    DirectStrategy,
    FormPostStrategy,
    RelayStrategy,
    StrategyChain,
    StrategyKind,
};
pub use types::{
    Notification,
    NotificationKind,
    Payload,
    SessionState,
    DISPATCH_ACTION,
    PAYLOAD_SOURCE,
    PLACEHOLDER_ENDPOINT,
};
pub use error::{ConfigError, DispatchError, FailureReason};
pub use surface::{HeadlessSurface, UiSurface};
