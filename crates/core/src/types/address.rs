//! Billing address types.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::AddressId;

/// A billing address owned by exactly one account.
///
/// `is_default` is only ever set by [`BillingLedger`](crate::BillingLedger);
/// nothing else constructs a `BillingAddress` with a chosen default flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingAddress {
    /// Stable identifier assigned when the address was added.
    pub id: AddressId,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Errors produced when validating a candidate address.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// One or more required fields were absent or blank.
    #[error("missing required billing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    /// A field exceeded its maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Maximum allowed length.
        max: usize,
    },
}

/// Unvalidated address fields as submitted by a client.
///
/// Any `isDefault` the client sends is ignored; defaults are decided by the
/// ledger.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

/// Validated address content, ready to be added to a ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl NewAddress {
    /// Maximum length of any single address field.
    pub const MAX_FIELD_LENGTH: usize = 200;
}

impl AddressInput {
    /// Validate the input, trimming every field.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::MissingFields` naming every blank field, or
    /// `AddressError::TooLong` for the first field over the length limit.
    pub fn validate(self) -> Result<NewAddress, AddressError> {
        let fields = [
            ("street", self.street),
            ("city", self.city),
            ("state", self.state),
            ("zipCode", self.zip_code),
            ("country", self.country),
        ];

        let mut missing = Vec::new();
        let mut values = Vec::with_capacity(fields.len());
        for (name, value) in fields {
            let trimmed = value.as_deref().map(str::trim).unwrap_or_default();
            if trimmed.is_empty() {
                missing.push(name);
            } else if trimmed.chars().count() > NewAddress::MAX_FIELD_LENGTH {
                return Err(AddressError::TooLong {
                    field: name,
                    max: NewAddress::MAX_FIELD_LENGTH,
                });
            }
            values.push(trimmed.to_owned());
        }

        if !missing.is_empty() {
            return Err(AddressError::MissingFields(missing));
        }

        let mut values = values.into_iter();
        let mut next = || values.next().unwrap_or_default();
        Ok(NewAddress {
            street: next(),
            city: next(),
            state: next(),
            zip_code: next(),
            country: next(),
        })
    }
}

/// Identifies one address within an account's ledger.
///
/// Older clients address entries by their zero-based position; newer ones use
/// the stable [`AddressId`]. Both forms are accepted in URL paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKey {
    /// Zero-based position in the ledger.
    Position(usize),
    /// Stable identifier assigned at insertion.
    Id(AddressId),
}

/// Error parsing an [`AddressKey`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("address key must be a position or an address id, got {0:?}")]
pub struct AddressKeyError(pub String);

impl FromStr for AddressKey {
    type Err = AddressKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(position) = s.parse::<usize>() {
            return Ok(Self::Position(position));
        }
        s.parse::<AddressId>()
            .map(Self::Id)
            .map_err(|_| AddressKeyError(s.to_owned()))
    }
}

impl fmt::Display for AddressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(position) => write!(f, "{position}"),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

impl From<AddressId> for AddressKey {
    fn from(id: AddressId) -> Self {
        Self::Id(id)
    }
}
