//! # geliom-core
//!
//! Core crate for Geliom. Contains configuration schemas, typed
//! identifiers, the unified error system, and small async building
//! blocks (lazy resources, bounded retries, best-effort background tasks).
//!
//! This crate has **no** internal dependencies on other Geliom crates.

pub mod config;
pub mod error;
pub mod result;
pub mod task;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
