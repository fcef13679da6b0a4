//! sqlx repositories implementing the [`crate::store`] traits.

pub mod dashboard;
pub mod lookup;
pub mod membership;
pub mod pending_notification;
pub mod rate_limit;
pub mod user;

pub use dashboard::DashboardRepository;
pub use lookup::LookupRepository;
pub use membership::MembershipRepository;
pub use pending_notification::PendingNotificationRepository;
pub use rate_limit::RateLimitRepository;
pub use user::UserRepository;
