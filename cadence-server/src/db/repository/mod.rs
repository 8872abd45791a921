//! Repository Module
//!
//! CRUD and business operations on the SQLite tables. Repositories are
//! free functions that borrow the pool; multi-step writes use explicit
//! transactions.

// Membership
pub mod member;
pub mod sector;

// Event ledger
pub mod activity;
pub mod code;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Already recorded: {0}")]
    AlreadyRecorded(String),

    #[error("Already redeemed: {0}")]
    AlreadyRedeemed(String),

    #[error("Not assignee: {0}")]
    NotAssignee(String),

    #[error("Scope violation: {0}")]
    ScopeViolation(String),

    #[error("Role violation: {0}")]
    RoleViolation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Insufficient budget: {0}")]
    InsufficientBudget(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// True when the error is a SQLite UNIQUE constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// True when the error is a SQLite FOREIGN KEY constraint violation
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// Points amounts must be strictly positive everywhere in the ledger
pub fn validate_points(points: i64, field_name: &str) -> RepoResult<()> {
    if points <= 0 {
        return Err(RepoError::Validation(format!(
            "{field_name} must be positive: {points}"
        )));
    }
    Ok(())
}
