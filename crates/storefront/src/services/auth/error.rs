//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during registration and login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] tidewater_core::EmailError),

    /// Display name missing or too long.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Invalid credentials (wrong password or unknown email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

/// Why the authentication gate turned a request away.
///
/// `MissingCredential` and `InvalidToken` render identically to clients; the
/// finer cause only reaches the logs.
#[derive(Debug, Error)]
pub enum AuthRejection {
    /// No `Authorization` header, wrong scheme, or empty token.
    #[error("missing credential")]
    MissingCredential,

    /// Token malformed, forged, expired, or for an account that no longer exists.
    #[error("invalid token")]
    InvalidToken,

    /// The account lookup failed for infrastructure reasons.
    #[error("account store unavailable: {0}")]
    StoreUnavailable(#[from] RepositoryError),
}
