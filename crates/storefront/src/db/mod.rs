//! Account storage for the storefront.
//!
//! The rest of the crate talks to storage through the [`AccountStore`] trait,
//! a key-addressed record store with three capabilities: point read, insert,
//! and a billing update that is conditional on the account version.
//!
//! # Implementations
//!
//! - [`PgAccountStore`] - `PostgreSQL`, table `storefront.account`
//! - [`MemoryAccountStore`] - process-local map for tests and development
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p tidewater-cli -- migrate
//! ```

pub mod accounts;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use tidewater_core::{AccountId, BillingLedger, Email};

use crate::models::Account;

pub use accounts::PgAccountStore;
pub use memory::MemoryAccountStore;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The record changed since it was read.
    #[error("stale version: expected {expected}")]
    StaleVersion {
        /// Version the caller read.
        expected: i64,
    },
}

/// Durable account storage.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetch an account by primary key.
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError>;

    /// Fetch an account by (normalized) email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError>;

    /// Insert a new account.
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn insert(&self, account: &Account) -> Result<(), RepositoryError>;

    /// Replace an account's billing addresses if its version still equals
    /// `expected_version`, bumping the version.
    ///
    /// Returns the updated account, `RepositoryError::StaleVersion` if the
    /// version moved, or `RepositoryError::NotFound` if the account is gone.
    async fn update_billing(
        &self,
        id: AccountId,
        expected_version: i64,
        billing: &BillingLedger,
    ) -> Result<Account, RepositoryError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
