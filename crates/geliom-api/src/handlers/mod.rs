//! Route handlers.

pub mod health;
pub mod membership;
pub mod notification;
pub mod pending;
