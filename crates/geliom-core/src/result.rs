//! Convenience result type alias for Geliom.

use crate::error::AppError;

/// A specialized `Result` type for Geliom operations.
pub type AppResult<T> = Result<T, AppError>;
