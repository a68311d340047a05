//! Profile and billing address handlers.
//!
//! Every handler here takes [`RequireAuth`], so auth failures are answered
//! before any account state is read or written.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Serialize;
use tracing::instrument;

use tidewater_core::{AddressInput, AddressKey, BillingAddress};

use super::users::json_body;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::ProfileView;
use crate::services::AccountService;
use crate::state::AppState;

/// Response to a billing address change.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingResponse {
    pub message: &'static str,
    pub billing_addresses: Vec<BillingAddress>,
}

impl BillingResponse {
    fn new(message: &'static str, view: ProfileView) -> Self {
        Self {
            message,
            billing_addresses: view.billing_addresses,
        }
    }
}

/// Parse the `{key}` path segment. Unparseable keys cannot name an address.
fn parse_key(raw: &str) -> Result<AddressKey> {
    raw.parse()
        .map_err(|_| AppError::NotFound("Address".to_string()))
}

/// Show the caller's profile.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Json<ProfileView> {
    Json(AccountService::new(state.store()).get_profile(&caller))
}

/// Append a billing address.
#[instrument(skip_all)]
pub async fn add_billing(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    payload: std::result::Result<Json<AddressInput>, JsonRejection>,
) -> Result<Json<BillingResponse>> {
    let input = json_body(payload)?;
    let view = AccountService::new(state.store())
        .add_billing_address(&caller, input)
        .await?;

    add_breadcrumb("billing", "Billing address added", None);
    Ok(Json(BillingResponse::new(
        "Billing address added successfully",
        view,
    )))
}

/// Replace the content of a billing address.
#[instrument(skip_all)]
pub async fn update_billing(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(key): Path<String>,
    payload: std::result::Result<Json<AddressInput>, JsonRejection>,
) -> Result<Json<BillingResponse>> {
    let key = parse_key(&key)?;
    let input = json_body(payload)?;
    let view = AccountService::new(state.store())
        .update_billing_address(&caller, key, input)
        .await?;

    Ok(Json(BillingResponse::new(
        "Billing address updated successfully",
        view,
    )))
}

/// Make a billing address the default.
#[instrument(skip_all)]
pub async fn set_default_billing(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(key): Path<String>,
) -> Result<Json<BillingResponse>> {
    let key = parse_key(&key)?;
    let view = AccountService::new(state.store())
        .make_default(&caller, key)
        .await?;

    let key = key.to_string();
    add_breadcrumb(
        "billing",
        "Default billing address changed",
        Some(&[("key", key.as_str())]),
    );
    Ok(Json(BillingResponse::new(
        "Default address updated successfully",
        view,
    )))
}
