//! Account domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tidewater_core::{AccountId, BillingAddress, BillingLedger, Email};

/// A storefront account (domain type).
///
/// `version` increases by one on every successful write and guards billing
/// updates against lost updates.
#[derive(Debug, Clone)]
pub struct Account {
    /// Unique account ID.
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// Case-normalized email address.
    pub email: Email,
    /// Argon2id PHC string. Never leaves the service layer.
    pub password_hash: String,
    /// Whether the account has administrator rights.
    pub is_admin: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// Optimistic concurrency version.
    pub version: i64,
    /// Billing addresses in insertion order.
    pub billing: BillingLedger,
}

impl Account {
    /// Build a freshly registered account with no addresses.
    #[must_use]
    pub fn new(name: String, email: Email, password_hash: String) -> Self {
        Self {
            id: AccountId::generate(),
            name,
            email,
            password_hash,
            is_admin: false,
            created_at: Utc::now(),
            version: 0,
            billing: BillingLedger::new(),
        }
    }
}

/// Read-only projection of an account returned to its owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: AccountId,
    pub name: String,
    pub email: Email,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub billing_addresses: Vec<BillingAddress>,
    /// Address checkout uses when the customer does not pick one.
    pub default_billing_address: Option<BillingAddress>,
}

impl From<&Account> for ProfileView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            is_admin: account.is_admin,
            created_at: account.created_at,
            billing_addresses: account.billing.as_slice().to_vec(),
            default_billing_address: account.billing.effective_default().cloned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use tidewater_core::NewAddress;

    #[test]
    fn test_profile_view_omits_password_hash() {
        let mut account = Account::new(
            "Jane".to_string(),
            Email::parse("jane@example.com").unwrap(),
            "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        );
        account.billing.add(NewAddress {
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip_code: "62701".to_string(),
            country: "USA".to_string(),
        });

        let json = serde_json::to_value(ProfileView::from(&account)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("argon2"));
        assert_eq!(json["email"], "jane@example.com");
        assert_eq!(json["billingAddresses"][0]["isDefault"], true);
        assert_eq!(json["defaultBillingAddress"]["street"], "1 Main St");
    }
}
