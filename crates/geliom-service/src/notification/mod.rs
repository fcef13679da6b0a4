//! Notification pipeline: rate-limit gate, message composer, fan-out
//! dispatcher and the pending-notification sweep.

pub mod composer;
pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod rescheduler;

pub use composer::MessageComposer;
pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use error::DispatchError;
pub use gate::{GateOutcome, RateLimitGate};
pub use rescheduler::{PendingNotificationSweeper, RowOutcome, SweepReport};
