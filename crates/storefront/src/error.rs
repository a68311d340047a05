//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`; every error renders as JSON `{ "message": ... }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AccountError, AuthError, AuthRejection};

/// Message for every rejected credential, whatever the cause.
pub const NOT_AUTHORIZED: &str = "Not authorized, token failed";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Registration or login failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// The auth gate turned the request away.
    #[error("Rejected: {0}")]
    Rejected(#[from] AuthRejection),

    /// Profile or billing operation failed.
    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists
                | AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidName(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Rejected(rejection) => match rejection {
                AuthRejection::MissingCredential | AuthRejection::InvalidToken => {
                    StatusCode::UNAUTHORIZED
                }
                AuthRejection::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::Account(err) => match err {
                AccountError::AccountNotFound | AccountError::AddressNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                AccountError::Validation(_) => StatusCode::BAD_REQUEST,
                AccountError::Conflict => StatusCode::CONFLICT,
                AccountError::Repository(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Client-facing message. Never includes internal details.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid email or password".to_string(),
                AuthError::UserAlreadyExists => "User already exists".to_string(),
                AuthError::WeakPassword(msg) | AuthError::InvalidName(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Internal server error".to_string()
                }
            },
            Self::Rejected(rejection) => match rejection {
                AuthRejection::MissingCredential | AuthRejection::InvalidToken => {
                    NOT_AUTHORIZED.to_string()
                }
                AuthRejection::StoreUnavailable(_) => {
                    "Service temporarily unavailable".to_string()
                }
            },
            Self::Account(err) => match err {
                AccountError::AccountNotFound => "User not found".to_string(),
                AccountError::AddressNotFound(_) => "Address not found".to_string(),
                AccountError::Validation(e) => e.to_string(),
                AccountError::Conflict => {
                    "Account was modified concurrently, please retry".to_string()
                }
                AccountError::Repository(_) => "Service temporarily unavailable".to_string(),
            },
            Self::NotFound(what) => format!("{what} not found"),
            Self::BadRequest(msg) => msg.clone(),
            Self::RateLimited => "Too many requests, please slow down".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "message": self.message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an account ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(account_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(account_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("billing", "Default address changed", Some(&[("key", "1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tidewater_core::{AddressError, AddressKey};

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("Address".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::BadRequest("test".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::Internal("test".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(AccountError::Conflict).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(AuthRejection::StoreUnavailable(RepositoryError::NotFound)).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(AccountError::Validation(AddressError::MissingFields(vec![
                "city"
            ])))
            .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_rejections_are_indistinguishable() {
        let missing = body_json(AuthRejection::MissingCredential.into()).await;
        let invalid = body_json(AuthRejection::InvalidToken.into()).await;
        assert_eq!(missing, invalid);
        assert_eq!(missing.0, StatusCode::UNAUTHORIZED);
        assert_eq!(missing.1["message"], NOT_AUTHORIZED);
    }

    #[tokio::test]
    async fn test_address_not_found_body() {
        let (status, body) =
            body_json(AccountError::AddressNotFound(AddressKey::Position(3)).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Address not found" }));
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let (_, body) = body_json(AppError::Internal("secret detail".to_string())).await;
        assert_eq!(body["message"], "Internal server error");
    }
}
