//! Operator bearer tokens.
//!
//! # Usage
//!
//! ```bash
//! tw-cli token issue --account 6f1c2a3e-8b1d-4c55-9a0e-2f4b7c9d1e00
//! tw-cli token issue --account 6f1c2a3e-8b1d-4c55-9a0e-2f4b7c9d1e00 --ttl-days 1
//! ```
//!
//! Tokens are signed with `STOREFRONT_TOKEN_SECRET`, so they are accepted by
//! any server sharing that secret.

use chrono::{Duration, Utc};
use thiserror::Error;

use tidewater_core::AccountId;
use tidewater_storefront::config::{ConfigError, TokenConfig};
use tidewater_storefront::services::{IssuedToken, TokenCodec};

/// Errors that can occur while issuing a token.
#[derive(Debug, Error)]
pub enum TokenCommandError {
    /// Token secret missing or rejected.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The requested lifetime is not positive.
    #[error("Invalid TTL: {0} days (must be at least 1)")]
    InvalidTtl(i64),
}

/// Issue a token for `account`.
///
/// Uses `ttl_days` when given, otherwise the configured lifetime.
///
/// # Errors
///
/// Returns `TokenCommandError` if the secret is missing or weak, or the TTL is
/// not positive.
pub fn issue(account: AccountId, ttl_days: Option<i64>) -> Result<IssuedToken, TokenCommandError> {
    let _ = dotenvy::dotenv();
    let codec = TokenCodec::new(&TokenConfig::from_env()?);

    let ttl = match ttl_days {
        Some(days) if days < 1 => return Err(TokenCommandError::InvalidTtl(days)),
        Some(days) => Duration::days(days),
        None => codec.ttl(),
    };

    let issued = codec.issue_at(account, ttl, Utc::now());
    tracing::info!(
        account_id = %account,
        expires_at = ?issued.claims.expires_at(),
        "Issued operator token"
    );
    Ok(issued)
}
