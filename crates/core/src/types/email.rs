//! Account email addresses.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Why a string was rejected as an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email must contain an @ symbol")]
    MissingAtSymbol,
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    #[error("email domain cannot be empty")]
    EmptyDomain,
}

/// The login identity of an account, trimmed and lower-cased.
///
/// Uniqueness is case-insensitive, so `" Jane@Example.COM"` and
/// `"jane@example.com"` parse to the same value. Deserialization goes
/// through [`Email::parse`] as well.
///
/// ```
/// use tidewater_core::Email;
///
/// let email = Email::parse(" Jane@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "jane@example.com");
/// assert!(Email::parse("jane.example.com").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Normalize and validate an address.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] for blank input, input over
    /// [`Self::MAX_LENGTH`], or an address without both a local part and a
    /// domain around the first `@`.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let trimmed = input.trim();
        match trimmed.len() {
            0 => return Err(EmailError::Empty),
            len if len > Self::MAX_LENGTH => {
                return Err(EmailError::TooLong {
                    max: Self::MAX_LENGTH,
                });
            }
            _ => {}
        }

        match trimmed.split_once('@') {
            None => Err(EmailError::MissingAtSymbol),
            Some(("", _)) => Err(EmailError::EmptyLocalPart),
            Some((_, "")) => Err(EmailError::EmptyDomain),
            Some(_) => Ok(Self(trimmed.to_lowercase())),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Email {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <str as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Email {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Self::parse(raw).map_err(Into::into)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Email {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0.as_str(), buf)
    }
}
