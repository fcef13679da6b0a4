//! Join-request and invite flows.

pub mod service;

pub use service::MembershipService;
