//! Business logic services.
//!
//! - [`token`] - Signs and verifies bearer tokens
//! - [`auth`] - Registration, login and the per-request authentication gate
//! - [`account`] - Profile reads and billing address updates

pub mod account;
pub mod auth;
pub mod token;

pub use account::{AccountError, AccountService};
pub use auth::{AuthError, AuthGate, AuthRejection, AuthService, AuthenticatedCaller, SignedIn};
pub use token::{Claims, IssuedToken, TokenCodec, TokenError};
