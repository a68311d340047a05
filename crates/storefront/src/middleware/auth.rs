//! Bearer token extractor.
//!
//! Runs the [`AuthGate`] for handlers that need an authenticated caller.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::Span;

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::{AuthGate, AuthRejection, AuthenticatedCaller};
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// Rejects with 401 when the credential is missing, invalid, expired, or
/// names an account that no longer exists. The handler never runs in that
/// case.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireAuth(caller): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", caller.account.name)
/// }
/// ```
pub struct RequireAuth(pub AuthenticatedCaller);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // A header that is not valid UTF-8 cannot carry a bearer token.
        let header = match parts.headers.get(AUTHORIZATION) {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| AppError::Rejected(AuthRejection::MissingCredential))?,
            ),
            None => None,
        };

        let caller = AuthGate::new(state.tokens(), state.store())
            .authenticate(header)
            .await?;

        Span::current().record("account_id", tracing::field::display(caller.id()));
        set_sentry_user(&caller.id(), Some(caller.account.email.as_str()));

        Ok(Self(caller))
    }
}
