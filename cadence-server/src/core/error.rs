use thiserror::Error;

/// Server lifecycle errors (startup and shutdown)
///
/// Request-level errors use [`crate::utils::AppError`] instead.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Startup failed: {0}")]
    Startup(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<crate::utils::AppError> for ServerError {
    fn from(e: crate::utils::AppError) -> Self {
        ServerError::Startup(e.to_string())
    }
}

/// Result alias for server lifecycle operations
pub type Result<T> = std::result::Result<T, ServerError>;
