//! Signed client assertions for the backend-services token request.
//!
//! A client assertion is a short-lived JWT (RFC 7523) that proves possession
//! of the registered private key. The token endpoint accepts it in place of
//! a client secret.
//!
//! # Claims
//!
//! - `iss` and `sub`: the client id
//! - `aud`: the token endpoint URL
//! - `jti`: unique per signing call
//! - `iat`: now
//! - `nbf`: now minus 60 seconds, tolerating provider clock skew
//! - `exp`: now plus 240 seconds, inside the usual 5 minute ceiling
//!
//! The JWT header carries `alg = RS384` and `kid = client id`.

use jsonwebtoken::{Algorithm, Header};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;
use crate::key::KeyMaterial;

/// Seconds subtracted from `iat` for the `nbf` claim.
pub const NOT_BEFORE_SKEW_SECS: i64 = 60;

/// Seconds added to `iat` for the `exp` claim.
pub const ASSERTION_LIFETIME_SECS: i64 = 240;

/// JWT claims of a client assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Issuer, the client id.
    pub iss: String,
    /// Subject, the client id.
    pub sub: String,
    /// Audience, the token endpoint URL.
    pub aud: String,
    /// Unique assertion id.
    pub jti: String,
    /// Expiration time as Unix timestamp.
    pub exp: i64,
    /// Not-before time as Unix timestamp.
    pub nbf: i64,
    /// Issued-at time as Unix timestamp.
    pub iat: i64,
}

impl AssertionClaims {
    /// Builds the claims for an assertion issued at `now`.
    #[must_use]
    pub fn issued_at(client_id: &str, audience: &str, now: OffsetDateTime) -> Self {
        let iat = now.unix_timestamp();
        Self {
            iss: client_id.to_string(),
            sub: client_id.to_string(),
            aud: audience.to_string(),
            jti: format!("{client_id}-{iat}-{}", uuid::Uuid::new_v4()),
            exp: iat + ASSERTION_LIFETIME_SECS,
            nbf: iat - NOT_BEFORE_SKEW_SECS,
            iat,
        }
    }
}

/// Signs client assertions with the loaded RSA key.
#[derive(Debug, Clone)]
pub struct AssertionSigner {
    client_id: String,
    audience: String,
    key: KeyMaterial,
}

impl AssertionSigner {
    /// Creates a signer for `client_id` whose assertions target `audience`
    /// (the token endpoint URL).
    #[must_use]
    pub fn new(client_id: impl Into<String>, audience: impl Into<String>, key: KeyMaterial) -> Self {
        Self {
            client_id: client_id.into(),
            audience: audience.into(),
            key,
        }
    }

    /// The client id used as issuer, subject and `kid`.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Signs a fresh assertion for a token request covering `scopes`.
    ///
    /// Scopes travel in the token request body, not in the assertion; they
    /// are only recorded in the trace.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if the signing primitive rejects the
    /// claims, or `AuthError::KeyLoad` if it rejects the key.
    pub fn sign(&self, scopes: &[String]) -> AuthResult<String> {
        self.sign_at(scopes, OffsetDateTime::now_utc())
    }

    /// Signs an assertion as if issued at `now`.
    ///
    /// # Errors
    ///
    /// See [`AssertionSigner::sign`].
    pub fn sign_at(&self, scopes: &[String], now: OffsetDateTime) -> AuthResult<String> {
        let claims = AssertionClaims::issued_at(&self.client_id, &self.audience, now);

        let mut header = Header::new(Algorithm::RS384);
        header.kid = Some(self.client_id.clone());

        let assertion = jsonwebtoken::encode(&header, &claims, self.key.encoding_key())?;

        tracing::debug!(
            client_id = %self.client_id,
            jti = %claims.jti,
            scope_count = scopes.len(),
            "Signed client assertion"
        );

        Ok(assertion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_claims_timing_window() {
        let now = datetime!(2024-05-01 12:00:00 UTC);
        let claims =
            AssertionClaims::issued_at("client-1", "https://example.org/oauth2/token", now);

        assert_eq!(claims.iss, "client-1");
        assert_eq!(claims.sub, "client-1");
        assert_eq!(claims.aud, "https://example.org/oauth2/token");
        assert_eq!(claims.iat, now.unix_timestamp());
        assert_eq!(claims.nbf, claims.iat - 60);
        assert_eq!(claims.exp, claims.iat + 240);
    }

    #[test]
    fn test_jti_unique_within_same_second() {
        let now = datetime!(2024-05-01 12:00:00 UTC);
        let a = AssertionClaims::issued_at("client-1", "aud", now);
        let b = AssertionClaims::issued_at("client-1", "aud", now);

        assert_ne!(a.jti, b.jti);
        assert!(a.jti.starts_with(&format!("client-1-{}-", now.unix_timestamp())));
    }
}
