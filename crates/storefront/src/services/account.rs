//! Account profile and billing address operations.
//!
//! Each billing write is a read-modify-write of the account's ledger guarded
//! by the account version. When another request wins the race the ledger
//! operation is re-applied to a fresh read, up to [`MAX_ATTEMPTS`] times.

use thiserror::Error;
use tracing::{debug, instrument, warn};

use tidewater_core::{AddressError, AddressInput, AddressKey, BillingLedger, LedgerError};

use crate::db::{AccountStore, RepositoryError};
use crate::models::{Account, ProfileView};
use crate::services::auth::AuthenticatedCaller;

/// Attempts per billing write before giving up with [`AccountError::Conflict`].
pub const MAX_ATTEMPTS: usize = 3;

/// Errors from account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// The caller's account no longer exists.
    #[error("account not found")]
    AccountNotFound,

    /// The address key matched nothing.
    #[error("address not found: {0}")]
    AddressNotFound(AddressKey),

    /// Submitted address fields are invalid.
    #[error(transparent)]
    Validation(#[from] AddressError),

    /// Concurrent writes kept invalidating the read version.
    #[error("account was modified concurrently")]
    Conflict,

    /// Storage failure.
    #[error("repository error: {0}")]
    Repository(RepositoryError),
}

impl From<LedgerError> for AccountError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AddressNotFound(key) => Self::AddressNotFound(key),
        }
    }
}

impl From<RepositoryError> for AccountError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::AccountNotFound,
            other => Self::Repository(other),
        }
    }
}

/// Profile and billing operations for an authenticated caller.
pub struct AccountService<'a> {
    store: &'a dyn AccountStore,
}

impl<'a> AccountService<'a> {
    /// Create a new account service.
    #[must_use]
    pub const fn new(store: &'a dyn AccountStore) -> Self {
        Self { store }
    }

    /// Profile of the caller as read by the auth gate.
    #[must_use]
    pub fn get_profile(&self, caller: &AuthenticatedCaller) -> ProfileView {
        ProfileView::from(&caller.account)
    }

    /// Append a billing address. The first address becomes the default.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Validation` if a field is blank or too long,
    /// `AccountError::Conflict` if retries run out, or a storage error.
    #[instrument(skip(self, caller, input), fields(account_id = %caller.id()))]
    pub async fn add_billing_address(
        &self,
        caller: &AuthenticatedCaller,
        input: AddressInput,
    ) -> Result<ProfileView, AccountError> {
        let address = input.validate()?;
        self.mutate_billing(caller, |ledger| {
            let position = ledger.add(address.clone());
            debug!(position, "billing address added");
            Ok(())
        })
        .await
    }

    /// Replace the content of an existing billing address.
    ///
    /// The address keeps its id, position and default flag.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::AddressNotFound` if `key` matches nothing,
    /// `AccountError::Validation` for bad fields, or the errors of
    /// [`add_billing_address`](Self::add_billing_address).
    #[instrument(skip(self, caller, input), fields(account_id = %caller.id(), key = %key))]
    pub async fn update_billing_address(
        &self,
        caller: &AuthenticatedCaller,
        key: AddressKey,
        input: AddressInput,
    ) -> Result<ProfileView, AccountError> {
        let content = input.validate()?;
        self.mutate_billing(caller, |ledger| {
            ledger.replace(key, content.clone())?;
            Ok(())
        })
        .await
    }

    /// Make the addressed entry the only default.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::AddressNotFound` if `key` matches nothing; no
    /// write happens in that case.
    #[instrument(skip(self, caller), fields(account_id = %caller.id(), key = %key))]
    pub async fn make_default(
        &self,
        caller: &AuthenticatedCaller,
        key: AddressKey,
    ) -> Result<ProfileView, AccountError> {
        self.mutate_billing(caller, |ledger| {
            ledger.set_default(key).map_err(AccountError::from)
        })
        .await
    }

    /// Apply `op` to the caller's ledger and persist it under a version check.
    ///
    /// The first attempt works on the account the gate already loaded; later
    /// attempts re-read it.
    async fn mutate_billing<F>(
        &self,
        caller: &AuthenticatedCaller,
        mut op: F,
    ) -> Result<ProfileView, AccountError>
    where
        F: FnMut(&mut BillingLedger) -> Result<(), AccountError> + Send,
    {
        let mut current: Account = caller.account.clone();

        for attempt in 1..=MAX_ATTEMPTS {
            let mut ledger = current.billing.clone();
            op(&mut ledger)?;

            match self
                .store
                .update_billing(current.id, current.version, &ledger)
                .await
            {
                Ok(updated) => return Ok(ProfileView::from(&updated)),
                Err(RepositoryError::StaleVersion { expected }) => {
                    warn!(attempt, expected, "billing write lost a version race");
                    current = self
                        .store
                        .find_by_id(current.id)
                        .await?
                        .ok_or(AccountError::AccountNotFound)?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AccountError::Conflict)
    }
}
