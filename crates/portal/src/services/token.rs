//! Session token codec.
//!
//! Tokens are three dot-separated base64url segments:
//!
//! ```text
//! b64({"alg":"HS256","typ":"JWT"}) . b64({sub,email,role,iat,exp}) . b64("mock-signature")
//! ```
//!
//! The signature segment is a placeholder and is never verified. Anyone who
//! can write the session slot can forge a session; the token is a carrier
//! for claims, not a security boundary.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use libris_core::{Email, Identity, Role, UserId};

use crate::store::CredentialStore;

/// Default token lifetime in hours.
pub const DEFAULT_TTL_HOURS: i64 = 24;

const HEADER_ALG: &str = "HS256";
const HEADER_TYP: &str = "JWT";
const SIGNATURE_PLACEHOLDER: &str = "mock-signature";

/// Errors produced when decoding a session token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Wrong segment count or a segment that is not base64 JSON.
    #[error("malformed session token: {0}")]
    Malformed(&'static str),

    /// The token's `exp` lies in the past.
    #[error("session token expired")]
    Expired,

    /// The token's subject no longer exists in the credential store.
    #[error("session token subject is not a known account")]
    UnknownSubject,
}

/// Token header segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

/// Claims carried in the payload segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Account ID of the subject.
    pub sub: UserId,
    /// Email at issue time.
    pub email: Email,
    /// Role at issue time.
    pub role: Role,
    /// Issued-at, epoch seconds.
    pub iat: i64,
    /// Expiry, epoch seconds.
    pub exp: i64,
}

impl TokenClaims {
    /// Expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Issue time as a timestamp.
    #[must_use]
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }
}

/// Encodes identities into session tokens and resolves tokens back to
/// identities through the credential store.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    credentials: Arc<CredentialStore>,
    ttl: TimeDelta,
}

impl TokenCodec {
    /// Create a codec with the default 24 hour lifetime.
    #[must_use]
    pub fn new(credentials: Arc<CredentialStore>) -> Self {
        Self::with_ttl(credentials, TimeDelta::hours(DEFAULT_TTL_HOURS))
    }

    /// Create a codec issuing tokens valid for `ttl`.
    #[must_use]
    pub const fn with_ttl(credentials: Arc<CredentialStore>, ttl: TimeDelta) -> Self {
        Self { credentials, ttl }
    }

    /// Lifetime of issued tokens.
    #[must_use]
    pub const fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Mint a token for `identity`, issued now.
    #[must_use]
    pub fn encode(&self, identity: &Identity) -> String {
        self.encode_at(identity, Utc::now())
    }

    /// Mint a token for `identity` issued at `issued_at`.
    ///
    /// `exp` is always `iat + ttl`.
    #[must_use]
    pub fn encode_at(&self, identity: &Identity, issued_at: DateTime<Utc>) -> String {
        let iat = issued_at.timestamp();
        let exp = iat + self.ttl.num_seconds();

        let header = serde_json::json!({ "alg": HEADER_ALG, "typ": HEADER_TYP });
        let payload = serde_json::json!({
            "sub": identity.id,
            "email": identity.email,
            "role": identity.role,
            "iat": iat,
            "exp": exp,
        });

        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(payload.to_string()),
            URL_SAFE_NO_PAD.encode(SIGNATURE_PLACEHOLDER),
        )
    }

    /// Resolve a token to the identity it was issued for, as of now.
    ///
    /// # Errors
    ///
    /// See [`TokenCodec::decode_at`].
    pub fn decode(&self, token: &str) -> Result<Identity, TokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Resolve a token to the identity it was issued for, as of `now`.
    ///
    /// The identity comes from the credential store, so a renamed account
    /// decodes with its current name.
    ///
    /// # Errors
    ///
    /// - `TokenError::Malformed` if the token does not have three segments or
    ///   any segment fails to parse
    /// - `TokenError::Expired` if `exp < now`, whatever the other claims hold
    /// - `TokenError::UnknownSubject` if `sub` is not in the credential store
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        let payload = Self::payload(token)?;

        // Expiry is judged before the other claims are interpreted
        let exp = payload
            .get("exp")
            .and_then(serde_json::Value::as_i64)
            .ok_or(TokenError::Malformed("payload has no integer exp"))?;
        if exp < now.timestamp() {
            return Err(TokenError::Expired);
        }

        let claims = claims_from(payload)?;
        self.credentials
            .find_by_id(&claims.sub)
            .ok_or(TokenError::UnknownSubject)
    }

    /// Parse a token's claims without checking expiry or the subject.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Malformed` if the token does not have three
    /// segments or any segment fails to parse.
    pub fn inspect(token: &str) -> Result<TokenClaims, TokenError> {
        claims_from(Self::payload(token)?)
    }

    /// Split a token and return its payload as untyped JSON.
    fn payload(token: &str) -> Result<serde_json::Value, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header, payload, signature] = segments.as_slice() else {
            return Err(TokenError::Malformed("expected three segments"));
        };

        let _header: TokenHeader =
            decode_segment(header, "header is not base64", "header is not a token header")?;
        let payload: serde_json::Value =
            decode_segment(payload, "payload is not base64", "payload is not JSON")?;
        URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed("signature is not base64"))?;

        Ok(payload)
    }
}

fn claims_from(payload: serde_json::Value) -> Result<TokenClaims, TokenError> {
    serde_json::from_value(payload)
        .map_err(|_| TokenError::Malformed("payload does not carry session claims"))
}

fn decode_segment<T: for<'de> Deserialize<'de>>(
    segment: &str,
    not_base64: &'static str,
    not_json: &'static str,
) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed(not_base64))?;

    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed(not_json))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(Arc::new(CredentialStore::with_demo_accounts()))
    }

    fn member(codec: &TokenCodec) -> Identity {
        codec
            .credentials
            .find_by_id(&UserId::new("2"))
            .unwrap()
    }

    #[test]
    fn test_roundtrip_preserves_identity() {
        let codec = codec();
        let identity = member(&codec);

        let token = codec.encode(&identity);
        let decoded = codec.decode(&token).unwrap();

        assert_eq!(decoded.id, identity.id);
        assert_eq!(decoded.email, identity.email);
        assert_eq!(decoded.role, identity.role);
    }

    #[test]
    fn test_wire_format() {
        let codec = codec();
        let identity = member(&codec);
        let issued = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        let token = codec.encode_at(&identity, issued);
        let segments: Vec<&str> = token.split('.').collect();
        assert_eq!(segments.len(), 3);

        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segments[0]).unwrap()).unwrap();
        assert_eq!(header, serde_json::json!({"alg": "HS256", "typ": "JWT"}));

        let claims = TokenCodec::inspect(&token).unwrap();
        assert_eq!(claims.sub, UserId::new("2"));
        assert_eq!(claims.role, Role::Member);
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_000_000 + 24 * 60 * 60);

        assert_eq!(
            URL_SAFE_NO_PAD.decode(segments[2]).unwrap(),
            b"mock-signature"
        );
    }

    #[test]
    fn test_expired_token() {
        let codec = codec();
        let identity = member(&codec);
        let now = Utc::now();

        let token = codec.encode_at(&identity, now - TimeDelta::hours(25));
        assert_eq!(codec.decode_at(&token, now), Err(TokenError::Expired));
    }

    #[test]
    fn test_expiry_wins_over_unknown_subject() {
        let codec = codec();
        let ghost = Identity {
            id: UserId::new("missing"),
            ..member(&codec)
        };
        let now = Utc::now();

        let token = codec.encode_at(&ghost, now - TimeDelta::hours(25));
        assert_eq!(codec.decode_at(&token, now), Err(TokenError::Expired));
    }

    #[test]
    fn test_expiry_wins_over_unreadable_claims() {
        let codec = codec();
        let token = format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(
                r#"{"sub":"2","email":"not-an-email","role":"superuser","iat":0,"exp":1}"#
            ),
            URL_SAFE_NO_PAD.encode(SIGNATURE_PLACEHOLDER),
        );

        assert_eq!(codec.decode(&token), Err(TokenError::Expired));
        assert!(matches!(
            TokenCodec::inspect(&token),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_unexpired_token_with_unreadable_claims_is_malformed() {
        let codec = codec();
        let token = format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(
                r#"{"sub":"2","email":"user@library.com","role":"superuser","iat":0,"exp":9999999999}"#
            ),
            URL_SAFE_NO_PAD.encode(SIGNATURE_PLACEHOLDER),
        );

        assert!(matches!(codec.decode(&token), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_token_valid_until_exp() {
        let codec = codec();
        let identity = member(&codec);
        let issued = Utc::now();
        let token = codec.encode_at(&identity, issued);

        let at_expiry = issued + TimeDelta::hours(DEFAULT_TTL_HOURS);
        assert!(codec.decode_at(&token, at_expiry).is_ok());

        let after_expiry = at_expiry + TimeDelta::seconds(1);
        assert_eq!(
            codec.decode_at(&token, after_expiry),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_unknown_subject() {
        let codec = codec();
        let ghost = Identity {
            id: UserId::new("user_gone"),
            ..member(&codec)
        };

        let token = codec.encode(&ghost);
        assert_eq!(codec.decode(&token), Err(TokenError::UnknownSubject));
    }

    #[test]
    fn test_malformed_tokens() {
        let codec = codec();
        let valid = codec.encode(&member(&codec));
        let segments: Vec<&str> = valid.split('.').collect();

        for bad in [
            String::new(),
            "only.two".to_owned(),
            format!("{valid}.extra"),
            format!("!!!.{}.{}", segments[1], segments[2]),
            format!("{}.{}.{}", segments[0], URL_SAFE_NO_PAD.encode("{}"), segments[2]),
            format!("{}.{}.%%%", segments[0], segments[1]),
            format!("{}.{}.{}", segments[1], segments[1], segments[2]),
        ] {
            assert!(
                matches!(codec.decode(&bad), Err(TokenError::Malformed(_))),
                "expected malformed: {bad}"
            );
        }
    }

    #[test]
    fn test_custom_ttl() {
        let codec = TokenCodec::with_ttl(
            Arc::new(CredentialStore::with_demo_accounts()),
            TimeDelta::minutes(5),
        );
        let identity = member(&codec);
        let token = codec.encode(&identity);

        let claims = TokenCodec::inspect(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 300);
    }
}
