//! Authentication service.
//!
//! Provides password registration and login, which hand out bearer tokens,
//! and the [`AuthGate`] that checks those tokens on every protected request.

mod error;
pub mod gate;

pub use error::{AuthError, AuthRejection};
pub use gate::{AuthGate, AuthenticatedCaller, IdentityResolver, bearer_token};

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::{info, instrument};

use tidewater_core::Email;

use crate::db::{AccountStore, RepositoryError};
use crate::models::Account;
use crate::services::token::{IssuedToken, TokenCodec};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length (bounds Argon2 work per request).
const MAX_PASSWORD_LENGTH: usize = 1024;

/// Maximum display name length.
const MAX_NAME_LENGTH: usize = 100;

/// Hash checked when the email is unknown, so a miss costs the same Argon2
/// work as a wrong password.
static UNKNOWN_ACCOUNT_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("unknown-account-placeholder").ok());

/// A successfully registered or logged-in account with its new token.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub account: Account,
    pub token: IssuedToken,
}

/// Authentication service.
///
/// Handles account registration and password login.
pub struct AuthService<'a> {
    store: &'a dyn AccountStore,
    codec: &'a TokenCodec,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn AccountStore, codec: &'a TokenCodec) -> Self {
        Self { store, codec }
    }

    /// Register a new account with name, email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidName` if the name is blank or too long.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<SignedIn, AuthError> {
        let name = validate_name(name)?;
        let email = Email::parse(email)?;
        validate_password(password)?;

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(password)?;
        let account = Account::new(name, email, password_hash);

        self.store.insert(&account).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

        info!(account_id = %account.id, "account registered");
        let token = self.codec.issue(account.id);
        Ok(SignedIn { account, token })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown,
    /// malformed, or the password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        // A malformed email cannot belong to an account; report it like any
        // other failed login.
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let Some(account) = self.store.find_by_email(&email).await? else {
            verify_unknown_account(password);
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &account.password_hash)?;

        info!(account_id = %account.id, "account logged in");
        let token = self.codec.issue(account.id);
        Ok(SignedIn { account, token })
    }
}

/// Validate and trim a display name.
fn validate_name(name: &str) -> Result<String, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::InvalidName("name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::InvalidName(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_owned())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Run a full password check that always fails.
fn verify_unknown_account(password: &str) {
    if let Some(hash) = UNKNOWN_ACCOUNT_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::TokenConfig;
    use crate::db::MemoryAccountStore;
    use secrecy::SecretString;

    fn codec() -> TokenCodec {
        TokenCodec::new(&TokenConfig::with_secret(SecretString::from(
            "k7Qp2#vX9!rT4@mZ8$wL1^bN6&cY3*hJ".to_string(),
        )))
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_unknown_account_hash_is_argon2id() {
        let hash = UNKNOWN_ACCOUNT_HASH.as_deref().unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(PasswordHash::new(hash).is_ok());
        assert!(verify_password("password123", hash).is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Jane Doe ").unwrap(), "Jane Doe");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"n".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryAccountStore::new();
        let codec = codec();
        let service = AuthService::new(&store, &codec);

        let registered = service
            .register("Jane", "Jane@Example.com", "password123")
            .await
            .unwrap();
        assert_eq!(registered.account.email.as_str(), "jane@example.com");
        assert!(!registered.account.is_admin);
        assert!(registered.account.billing.is_empty());
        assert_ne!(registered.account.password_hash, "password123");

        let claims = codec.verify(&registered.token.token).unwrap();
        assert_eq!(claims.sub, registered.account.id);

        let logged_in = service
            .login("jane@example.com", "password123")
            .await
            .unwrap();
        assert_eq!(logged_in.account.id, registered.account.id);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_any_case() {
        let store = MemoryAccountStore::new();
        let codec = codec();
        let service = AuthService::new(&store, &codec);

        service
            .register("Jane", "jane@example.com", "password123")
            .await
            .unwrap();
        assert!(matches!(
            service
                .register("Other", "JANE@example.com", "password456")
                .await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryAccountStore::new();
        let codec = codec();
        let service = AuthService::new(&store, &codec);
        service
            .register("Jane", "jane@example.com", "password123")
            .await
            .unwrap();

        for (email, password) in [
            ("jane@example.com", "wrong-password"),
            ("nobody@example.com", "password123"),
            ("not-an-email", "password123"),
        ] {
            assert!(matches!(
                service.login(email, password).await,
                Err(AuthError::InvalidCredentials)
            ));
        }
    }
}
