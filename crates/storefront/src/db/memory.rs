//! In-memory account store.
//!
//! Holds accounts in a `HashMap` behind a tokio `RwLock`. The version check in
//! `update_billing` happens under the write lock, so it gives the same
//! conditional-write guarantee as the `PostgreSQL` store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use tidewater_core::{AccountId, BillingLedger, Email};

use super::{AccountStore, RepositoryError};
use crate::models::Account;

/// Process-local [`AccountStore`]. Not durable.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
}

impl MemoryAccountStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove an account. Accounts are never deleted through the API; this
    /// exists for operators and tests.
    pub async fn remove(&self, id: AccountId) -> Option<Account> {
        self.accounts.write().await.remove(&id)
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| &a.email == email)
            .cloned())
    }

    async fn insert(&self, account: &Account) -> Result<(), RepositoryError> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        if accounts.contains_key(&account.id) {
            return Err(RepositoryError::Conflict("id already exists".to_owned()));
        }
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn update_billing(
        &self,
        id: AccountId,
        expected_version: i64,
        billing: &BillingLedger,
    ) -> Result<Account, RepositoryError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if account.version != expected_version {
            return Err(RepositoryError::StaleVersion {
                expected: expected_version,
            });
        }
        account.billing = billing.clone();
        account.version += 1;
        Ok(account.clone())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn account(email: &str) -> Account {
        Account::new(
            "Test".to_string(),
            Email::parse(email).unwrap(),
            "hash".to_string(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryAccountStore::new();
        let account = account("a@example.com");
        store.insert(&account).await.unwrap();

        let by_id = store.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, account.email);

        let email = Email::parse("A@Example.com").unwrap();
        assert!(store.find_by_email(&email).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_insert_duplicate_email() {
        let store = MemoryAccountStore::new();
        store.insert(&account("a@example.com")).await.unwrap();
        let err = store.insert(&account("a@example.com")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_billing_checks_version() {
        let store = MemoryAccountStore::new();
        let account = account("a@example.com");
        store.insert(&account).await.unwrap();

        let updated = store
            .update_billing(account.id, 0, &BillingLedger::new())
            .await
            .unwrap();
        assert_eq!(updated.version, 1);

        let err = store
            .update_billing(account.id, 0, &BillingLedger::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::StaleVersion { expected: 0 }));
    }

    #[tokio::test]
    async fn test_update_billing_missing_account() {
        let store = MemoryAccountStore::new();
        let err = store
            .update_billing(AccountId::generate(), 0, &BillingLedger::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
