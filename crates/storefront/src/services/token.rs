//! Bearer token codec.
//!
//! Tokens are three base64url (no padding) segments joined by dots:
//!
//! ```text
//! base64url({"alg":"HS256","typ":"JWT"}) . base64url({"sub":..,"iat":..,"exp":..}) . base64url(HMAC-SHA256)
//! ```
//!
//! The signature covers the first two segments exactly as transmitted. The
//! codec holds no state besides the injected secret; the clock is passed in
//! explicitly by the `*_at` methods so expiry is testable.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use tidewater_core::AccountId;

use crate::config::TokenConfig;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";

/// Reasons a token fails verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The token could not be parsed.
    #[error("malformed token")]
    Malformed,
    /// The signature does not match the current secret.
    #[error("bad token signature")]
    BadSignature,
    /// The token is past its expiry.
    #[error("token expired")]
    Expired,
}

impl TokenError {
    /// Short label for structured logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::BadSignature => "bad_signature",
            Self::Expired => "expired",
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Header<'a> {
    alg: &'a str,
    typ: &'a str,
}

/// Token payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account the token was issued to.
    pub sub: AccountId,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expires-at, seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    /// Expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// A freshly issued token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Wire form sent to the client.
    pub token: String,
    /// Decoded payload.
    pub claims: Claims,
}

/// Issues and verifies signed bearer tokens.
#[derive(Clone)]
pub struct TokenCodec {
    secret: SecretString,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenCodec {
    /// Create a codec from token configuration.
    #[must_use]
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            ttl: config.ttl,
        }
    }

    /// Lifetime applied by [`issue`](Self::issue).
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject` with the configured lifetime.
    #[must_use]
    pub fn issue(&self, subject: AccountId) -> IssuedToken {
        self.issue_at(subject, self.ttl, Utc::now())
    }

    /// Issue a token for `subject` valid for `ttl` from `now`.
    #[must_use]
    pub fn issue_at(&self, subject: AccountId, ttl: Duration, now: DateTime<Utc>) -> IssuedToken {
        let iat = now.timestamp();
        let claims = Claims {
            sub: subject,
            iat,
            exp: iat.saturating_add(ttl.num_seconds()),
        };

        let header = encode_json(&Header {
            alg: ALGORITHM,
            typ: TOKEN_TYPE,
        });
        let payload = encode_json(&claims);
        let signing_input = format!("{header}.{payload}");
        let signature = URL_SAFE_NO_PAD.encode(self.sign(signing_input.as_bytes()));

        IssuedToken {
            token: format!("{signing_input}.{signature}"),
            claims,
        }
    }

    /// Verify a token against the current time.
    ///
    /// # Errors
    ///
    /// See [`verify_at`](Self::verify_at).
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as of `now`.
    ///
    /// # Errors
    ///
    /// - `TokenError::Malformed` if the token is not three base64url segments
    ///   with a supported header and a parseable payload
    /// - `TokenError::BadSignature` if the signature does not match
    /// - `TokenError::Expired` if `now` is at or past the expiry
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed);
        };

        let header_bytes = decode_segment(header)?;
        let parsed: Header<'_> =
            serde_json::from_slice(&header_bytes).map_err(|_| TokenError::Malformed)?;
        if parsed.alg != ALGORITHM {
            return Err(TokenError::Malformed);
        }

        let signature = decode_segment(signature)?;
        let signing_input_len = header.len() + 1 + payload.len();
        let signing_input = token
            .get(..signing_input_len)
            .ok_or(TokenError::Malformed)?;
        self.mac(signing_input.as_bytes())
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let claims: Claims = serde_json::from_slice(&decode_segment(payload)?)
            .map_err(|_| TokenError::Malformed)?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// # Panics
    ///
    /// Never panics: HMAC-SHA256 accepts keys of any length.
    fn mac(&self, input: &[u8]) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC-SHA256 accepts keys of any length");
        mac.update(input);
        mac
    }

    fn sign(&self, input: &[u8]) -> Vec<u8> {
        self.mac(input).finalize().into_bytes().to_vec()
    }
}

fn encode_json<T: Serialize>(value: &T) -> String {
    // Serializing these plain structs to a Vec cannot fail.
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, TokenError> {
    if segment.is_empty() {
        return Err(TokenError::Malformed);
    }
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::new(&TokenConfig::with_secret(SecretString::from(
            secret.to_string(),
        )))
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_issue_then_verify() {
        let codec = codec("k7Qp2#vX9!rT4@mZ8$wL1^bN6&cY3*hJ");
        let subject = AccountId::generate();
        let issued = codec.issue_at(subject, Duration::days(30), t0());

        let claims = codec.verify_at(&issued.token, t0()).unwrap();
        assert_eq!(claims.sub, subject);
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 60 * 60);
        assert_eq!(issued.claims, claims);
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = codec("k7Qp2#vX9!rT4@mZ8$wL1^bN6&cY3*hJ");
        let ttl = Duration::days(30);
        let issued = codec.issue_at(AccountId::generate(), ttl, t0());

        let just_before = t0() + ttl - Duration::seconds(1);
        assert!(codec.verify_at(&issued.token, just_before).is_ok());
        assert_eq!(
            codec.verify_at(&issued.token, t0() + ttl),
            Err(TokenError::Expired)
        );
        assert_eq!(
            codec.verify_at(&issued.token, t0() + ttl + Duration::days(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_other_secret_is_bad_signature() {
        let issued = codec("k7Qp2#vX9!rT4@mZ8$wL1^bN6&cY3*hJ").issue_at(
            AccountId::generate(),
            Duration::days(30),
            t0(),
        );
        let rotated = codec("Zq8!pW3@xR6#tY1$uI4%oP7^aS2&dF5*");
        assert_eq!(
            rotated.verify_at(&issued.token, t0()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_malformed_inputs() {
        let codec = codec("k7Qp2#vX9!rT4@mZ8$wL1^bN6&cY3*hJ");
        for token in ["", "abc", "a.b", "a.b.c.d", "..", "!!.??.**"] {
            assert_eq!(
                codec.verify_at(token, t0()),
                Err(TokenError::Malformed),
                "{token:?}"
            );
        }
    }

    #[test]
    fn test_unsupported_algorithm_is_malformed() {
        let codec = codec("k7Qp2#vX9!rT4@mZ8$wL1^bN6&cY3*hJ");
        let issued = codec.issue_at(AccountId::generate(), Duration::days(1), t0());
        let parts: Vec<&str> = issued.token.split('.').collect();
        let none_header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let forged = format!("{none_header}.{}.{}", parts[1], parts[2]);
        assert_eq!(codec.verify_at(&forged, t0()), Err(TokenError::Malformed));
    }

    #[test]
    fn test_swapped_payload_is_bad_signature() {
        let codec = codec("k7Qp2#vX9!rT4@mZ8$wL1^bN6&cY3*hJ");
        let victim = codec.issue_at(AccountId::generate(), Duration::days(1), t0());
        let attacker = codec.issue_at(AccountId::generate(), Duration::days(1), t0());

        let v: Vec<&str> = victim.token.split('.').collect();
        let a: Vec<&str> = attacker.token.split('.').collect();
        let forged = format!("{}.{}.{}", a[0], v[1], a[2]);
        assert_eq!(
            codec.verify_at(&forged, t0()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let codec = codec("k7Qp2#vX9!rT4@mZ8$wL1^bN6&cY3*hJ");
        assert!(!format!("{codec:?}").contains("k7Qp2"));
    }

    proptest! {
        /// Changing any single byte of the payload never yields a valid token.
        #[test]
        fn prop_tampered_payload_rejected(offset in 0usize..1000, replacement in any::<u8>()) {
            let codec = codec("k7Qp2#vX9!rT4@mZ8$wL1^bN6&cY3*hJ");
            let subject = AccountId::generate();
            let issued = codec.issue_at(subject, Duration::days(30), t0());

            let header_len = issued.token.find('.').unwrap();
            let payload_len = issued.token[header_len + 1..].find('.').unwrap();
            let index = header_len + 1 + offset % payload_len;

            let mut bytes = issued.token.into_bytes();
            prop_assume!(bytes[index] != replacement);
            bytes[index] = replacement;
            let tampered = String::from_utf8_lossy(&bytes).into_owned();

            prop_assert!(codec.verify_at(&tampered, t0()).is_err());
        }
    }
}
