//! Registration and login handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tidewater_core::{AccountId, Email};

use crate::error::{AppError, Result};
use crate::services::auth::{AuthService, SignedIn};
use crate::state::AppState;

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Account summary returned with a fresh token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: AccountId,
    pub name: String,
    pub email: Email,
    pub is_admin: bool,
    pub token: String,
}

impl From<SignedIn> for AuthResponse {
    fn from(signed_in: SignedIn) -> Self {
        Self {
            id: signed_in.account.id,
            name: signed_in.account.name,
            email: signed_in.account.email,
            is_admin: signed_in.account.is_admin,
            token: signed_in.token.token,
        }
    }
}

/// Unwrap a JSON body, turning extractor failures into a JSON 400.
pub(super) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Handle registration.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let form = json_body(payload)?;
    let signed_in = AuthService::new(state.store(), state.tokens())
        .register(&form.name, &form.email, &form.password)
        .await?;

    Ok((StatusCode::CREATED, Json(AuthResponse::from(signed_in))))
}

/// Handle login.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let form = json_body(payload)?;
    let signed_in = AuthService::new(state.store(), state.tokens())
        .login(&form.email, &form.password)
        .await?;

    Ok(Json(AuthResponse::from(signed_in)))
}
