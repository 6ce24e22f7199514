//! Shared primitives for all Rust crates in the campus portal core.

#![forbid(unsafe_code)]

/// Identity primitives shared across the portal crates.
pub mod identity;

use thiserror::Error;

pub use identity::{UserId, UserIdentity};

/// Result type used across campus portal crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Sign-in called with an empty role set or an active role outside it.
    #[error("invalid session: {0}")]
    InvalidSession(String),

    /// Role value is not part of the configured registry.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// Session record store failed to read or write.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
