//! Custom Axum extractors.

pub mod auth;
pub mod function_key;

pub use auth::AuthUser;
pub use function_key::FunctionCaller;
