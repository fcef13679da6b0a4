//! Small async building blocks shared by the service, realtime, and API
//! crates.

pub mod background;
pub mod lazy;
pub mod retry;

pub use background::spawn_best_effort;
pub use lazy::{LazyResource, LazyStatus};
pub use retry::{RetryOutcome, RetryPolicy, retry_until};
