//! Per-request authentication gate.
//!
//! Every protected handler goes through [`AuthGate::authenticate`] before it
//! touches account state:
//!
//! 1. Parse `Authorization: Bearer <token>`
//! 2. Verify the token signature and expiry
//! 3. Re-read the account named by the token (no caching, so accounts that
//!    disappeared are rejected on their next request)

use tracing::{debug, warn};

use tidewater_core::AccountId;

use super::AuthRejection;
use crate::db::{AccountStore, RepositoryError};
use crate::models::Account;
use crate::services::token::TokenCodec;

/// Authentication scheme expected in the `Authorization` header.
pub const BEARER_SCHEME: &str = "Bearer";

/// The account behind an authenticated request.
///
/// Lives for one request only; handlers get it through the
/// [`RequireAuth`](crate::middleware::RequireAuth) extractor.
#[derive(Debug, Clone)]
pub struct AuthenticatedCaller {
    /// Account state as read at authentication time.
    pub account: Account,
}

impl AuthenticatedCaller {
    /// ID of the authenticated account.
    #[must_use]
    pub const fn id(&self) -> AccountId {
        self.account.id
    }
}

/// Looks up the account named by a token subject.
pub struct IdentityResolver<'a> {
    store: &'a dyn AccountStore,
}

impl<'a> IdentityResolver<'a> {
    /// Create a resolver over a store.
    #[must_use]
    pub const fn new(store: &'a dyn AccountStore) -> Self {
        Self { store }
    }

    /// Fetch the current state of `subject`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be read.
    pub async fn resolve(&self, subject: AccountId) -> Result<Option<Account>, RepositoryError> {
        self.store.find_by_id(subject).await
    }
}

/// Composes token verification and identity resolution.
pub struct AuthGate<'a> {
    codec: &'a TokenCodec,
    resolver: IdentityResolver<'a>,
}

impl<'a> AuthGate<'a> {
    /// Create a gate.
    #[must_use]
    pub const fn new(codec: &'a TokenCodec, store: &'a dyn AccountStore) -> Self {
        Self {
            codec,
            resolver: IdentityResolver::new(store),
        }
    }

    /// Authenticate a raw `Authorization` header value.
    ///
    /// # Errors
    ///
    /// - `AuthRejection::MissingCredential` if the header is absent, uses
    ///   another scheme, or carries an empty token
    /// - `AuthRejection::InvalidToken` if the token fails verification or
    ///   names an account that does not exist
    /// - `AuthRejection::StoreUnavailable` if the account lookup fails
    pub async fn authenticate(
        &self,
        header: Option<&str>,
    ) -> Result<AuthenticatedCaller, AuthRejection> {
        let Some(token) = header.and_then(bearer_token) else {
            debug!(
                header_present = header.is_some(),
                "rejecting request without bearer credential"
            );
            return Err(AuthRejection::MissingCredential);
        };

        let claims = self.codec.verify(token).map_err(|err| {
            warn!(cause = err.as_str(), "rejecting bearer token");
            AuthRejection::InvalidToken
        })?;

        let Some(account) = self.resolver.resolve(claims.sub).await? else {
            warn!(
                account_id = %claims.sub,
                cause = "account_not_found",
                "rejecting bearer token"
            );
            return Err(AuthRejection::InvalidToken);
        };

        debug!(account_id = %account.id, "request authenticated");
        Ok(AuthenticatedCaller { account })
    }
}

/// Extract the token from a `Bearer <token>` header value.
///
/// The scheme is matched case-insensitively. Returns `None` for any other
/// scheme or an empty token.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
