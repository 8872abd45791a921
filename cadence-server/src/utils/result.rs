//! Handler Result Alias
//!
//! Handlers return `AppResult<Json<T>>`; axum turns the `Err` side into
//! the error envelope via `AppError::into_response`.

use crate::AppError;

/// Result type for HTTP handlers and the layers they call into
pub type AppResult<T> = Result<T, AppError>;
