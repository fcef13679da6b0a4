//! # geliom-api
//!
//! HTTP surface for Geliom built on Axum.
//!
//! Exposes the two notification functions (dispatch and pending sweep),
//! the membership routes that trigger notifications, and a health check.
//! Also owns the extractors, request logging, and the mapping from domain
//! errors to HTTP responses.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
