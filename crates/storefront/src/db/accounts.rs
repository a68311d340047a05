//! `PostgreSQL` account store.
//!
//! Billing addresses are stored as a JSONB array on the account row, so an
//! account and its ledger are always read and written together. Writes to the
//! ledger are conditional on `version`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use tidewater_core::{AccountId, BillingAddress, BillingLedger, Email};

use super::{AccountStore, RepositoryError};
use crate::models::Account;

const ACCOUNT_COLUMNS: &str =
    "id, name, email, password_hash, is_admin, created_at, version, billing_addresses";

/// Database row for `storefront.account`.
#[derive(sqlx::FromRow)]
struct AccountRow {
    id: AccountId,
    name: String,
    email: String,
    password_hash: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
    version: i64,
    billing_addresses: Json<Vec<BillingAddress>>,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            password_hash: row.password_hash,
            is_admin: row.is_admin,
            created_at: row.created_at,
            version: row.version,
            billing: BillingLedger::from_stored(row.billing_addresses.0),
        })
    }
}

/// [`AccountStore`] backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM storefront.account WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM storefront.account WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn insert(&self, account: &Account) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.account
                (id, name, email, password_hash, is_admin, created_at, version, billing_addresses)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(account.id)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.is_admin)
        .bind(account.created_at)
        .bind(account.version)
        .bind(Json(&account.billing))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(())
    }

    async fn update_billing(
        &self,
        id: AccountId,
        expected_version: i64,
        billing: &BillingLedger,
    ) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r"
            UPDATE storefront.account
            SET billing_addresses = $3, version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING {ACCOUNT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(expected_version)
        .bind(Json(billing))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Account::try_from(row);
        }

        // No row matched: either the account is gone or someone else wrote first.
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT version FROM storefront.account WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match exists {
            Some(_) => Err(RepositoryError::StaleVersion {
                expected: expected_version,
            }),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
