//! # geliom-service
//!
//! The notification pipeline and the membership flows that feed it.
//!
//! Services follow constructor injection: every store and provider is
//! passed in as an `Arc<dyn Trait>` so the HTTP surface, the worker and the
//! tests can wire real repositories or in-memory fakes.

pub mod membership;
pub mod notification;
pub mod push;

pub use membership::MembershipService;
pub use notification::{
    DispatchError, DispatchReport, GateOutcome, MessageComposer, NotificationDispatcher,
    PendingNotificationSweeper, RateLimitGate, SweepReport,
};
pub use push::{OneSignalClient, PushProvider};
