//! Access token issuance and caching.
//!
//! [`TokenIssuer`] exchanges a signed client assertion for an access token
//! at the provider's token endpoint (client-credentials grant with
//! `private_key_jwt` client authentication) and caches the result.
//!
//! # Caching
//!
//! At most one token is cached. It is handed out only while
//! `now < expiry - margin` (5 minutes by default); an expired token is
//! discarded and never reused. The cache sits behind an async mutex that is
//! held across the network refresh, so concurrent callers that all find
//! the cache stale collapse onto a single token request. Cancelling a caller
//! mid-refresh leaves the previous cache state untouched.
//!
//! # Failure mode
//!
//! [`TokenIssuer::get_token`] is fail-soft: any signing, transport or HTTP
//! failure is logged and reported as `None`. Use
//! [`TokenIssuer::try_get_token`] for the typed error.

use std::fmt;
use std::time::Duration as StdDuration;

use serde::Deserialize;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;

use chartlink_core::truncate_for_log;

use crate::AuthResult;
use crate::assertion::AssertionSigner;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::key::KeyMaterial;

/// `client_assertion_type` value for JWT bearer client authentication.
pub const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Lifetime assumed when the token response omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// A bearer access token with its absolute expiry.
///
/// `Debug` never prints the token value.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    token_type: String,
    scopes: Vec<String>,
    expires_at: OffsetDateTime,
}

impl AccessToken {
    /// Creates a token that expires at `expires_at`.
    #[must_use]
    pub fn new(
        value: impl Into<String>,
        token_type: impl Into<String>,
        scopes: Vec<String>,
        expires_at: OffsetDateTime,
    ) -> Self {
        Self {
            value: value.into(),
            token_type: token_type.into(),
            scopes,
            expires_at,
        }
    }

    /// The raw token, for the `Authorization: Bearer` header.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Token type reported by the provider, usually `Bearer`.
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Scopes granted by the provider.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Absolute expiry instant.
    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }

    /// Returns `true` while `now < expires_at - margin`.
    #[must_use]
    pub fn is_usable_at(&self, now: OffsetDateTime, margin: Duration) -> bool {
        now < self.expires_at - margin
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("scopes", &self.scopes)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Successful token endpoint response body.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// The issued access token.
    pub access_token: String,
    /// Token type, normally `Bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Space-separated granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl TokenResponse {
    /// Converts the response into a token issued at `now`.
    ///
    /// Missing `token_type` defaults to `Bearer`, missing `scope` to the
    /// requested scopes and missing `expires_in` to one hour.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenRequest` if `expires_in` overflows the clock.
    pub fn into_token(self, requested: &[String], now: OffsetDateTime) -> AuthResult<AccessToken> {
        let expires_in = self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let lifetime = i64::try_from(expires_in)
            .map(Duration::seconds)
            .map_err(|_| AuthError::token_rejected(200, "expires_in out of range"))?;
        let expires_at = now
            .checked_add(lifetime)
            .ok_or_else(|| AuthError::token_rejected(200, "expires_in out of range"))?;

        let scopes = match self.scope {
            Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
            None => requested.to_vec(),
        };

        Ok(AccessToken {
            value: self.access_token,
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
            scopes,
            expires_at,
        })
    }
}

/// Issues and caches backend-services access tokens.
pub struct TokenIssuer {
    signer: AssertionSigner,
    token_url: String,
    default_scopes: Vec<String>,
    margin: Duration,
    http: reqwest::Client,
    cache: Mutex<Option<AccessToken>>,
}

impl TokenIssuer {
    /// Validates `config`, loads its key and builds an issuer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` for invalid settings and
    /// `AuthError::KeyLoad` when the private key cannot be loaded. Both are
    /// fatal for the process.
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        config
            .validate()
            .map_err(|e| AuthError::configuration(e.to_string()))?;
        let key = KeyMaterial::from_config(config)?;
        Self::new(config, key)
    }

    /// Builds an issuer from configuration and an already loaded key.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the margin is out of range or
    /// the HTTP client cannot be built.
    pub fn new(config: &AuthConfig, key: KeyMaterial) -> AuthResult<Self> {
        let margin = Duration::try_from(config.token_margin)
            .map_err(|e| AuthError::configuration(format!("auth.token_margin: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AuthError::configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            signer: AssertionSigner::new(&config.client_id, &config.token_url, key),
            token_url: config.token_url.clone(),
            default_scopes: config.effective_scopes(),
            margin,
            http,
            cache: Mutex::new(None),
        })
    }

    /// Safety margin applied before expiry.
    #[must_use]
    pub fn margin(&self) -> StdDuration {
        self.margin.unsigned_abs()
    }

    /// Returns a usable token, fetching a new one when needed.
    ///
    /// `scopes` of `None` requests the configured default scopes. Any failure
    /// is logged and reported as `None`.
    ///
    /// A token fetched by this call is returned even when its `expires_in`
    /// is at or below the margin; such a token is never served from the cache.
    pub async fn get_token(
        &self,
        scopes: Option<&[String]>,
        force_refresh: bool,
    ) -> Option<AccessToken> {
        match self.try_get_token(scopes, force_refresh).await {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!(
                    client_id = %self.signer.client_id(),
                    status = ?e.status(),
                    error = %e,
                    "Access token unavailable"
                );
                None
            }
        }
    }

    /// Returns a usable token, fetching a new one when needed.
    ///
    /// A cached token is returned while `now < expiry - margin` unless
    /// `force_refresh` is set, in which case the token endpoint is always
    /// called. A freshly fetched token whose lifetime is already inside the
    /// margin is still returned once, but never cached for reuse.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if the assertion cannot be signed and
    /// `AuthError::TokenRequest` if the endpoint fails or rejects it.
    pub async fn try_get_token(
        &self,
        scopes: Option<&[String]>,
        force_refresh: bool,
    ) -> AuthResult<AccessToken> {
        let mut cache = self.cache.lock().await;

        if !force_refresh {
            if let Some(token) = self.usable(cache.as_ref()) {
                tracing::debug!(expires_at = %token.expires_at, "Using cached access token");
                return Ok(token.clone());
            }
        }

        let scopes = scopes.unwrap_or(&self.default_scopes);
        match self.request_token(scopes).await {
            Ok(token) => {
                *cache = Some(token.clone());
                Ok(token)
            }
            Err(e) => {
                if self.usable(cache.as_ref()).is_none() {
                    *cache = None;
                }
                Err(e)
            }
        }
    }

    /// Refreshes after the provider rejected `rejected` as unauthorized.
    ///
    /// When another caller has already replaced the rejected token with a
    /// usable one, that token is returned without a new request. Otherwise
    /// a token is force-fetched with the default scopes.
    pub async fn refresh_rejected(&self, rejected: &AccessToken) -> Option<AccessToken> {
        let mut cache = self.cache.lock().await;

        if let Some(token) = self.usable(cache.as_ref()) {
            if token.value != rejected.value {
                tracing::debug!("Rejected token already replaced by a concurrent refresh");
                return Some(token.clone());
            }
        }

        tracing::info!(client_id = %self.signer.client_id(), "Refreshing rejected access token");
        match self.request_token(&self.default_scopes).await {
            Ok(token) => {
                *cache = Some(token.clone());
                Some(token)
            }
            Err(e) => {
                *cache = None;
                tracing::warn!(status = ?e.status(), error = %e, "Access token refresh failed");
                None
            }
        }
    }

    /// Drops the cached token so the next call fetches a new one.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    /// The cached token, if any, regardless of expiry.
    pub async fn cached(&self) -> Option<AccessToken> {
        self.cache.lock().await.clone()
    }

    fn usable<'a>(&self, token: Option<&'a AccessToken>) -> Option<&'a AccessToken> {
        let now = OffsetDateTime::now_utc();
        token.filter(|t| t.is_usable_at(now, self.margin))
    }

    async fn request_token(&self, scopes: &[String]) -> AuthResult<AccessToken> {
        let assertion = self.signer.sign(scopes)?;
        let scope = scopes.join(" ");

        tracing::info!(
            token_url = %self.token_url,
            scope = %scope,
            "Requesting access token"
        );

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_assertion_type", CLIENT_ASSERTION_TYPE),
                ("client_assertion", assertion.as_str()),
                ("scope", scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::token_transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::token_transport(e.to_string()))?;

        if !status.is_success() {
            let body = truncate_for_log(&body);
            tracing::warn!(
                status = status.as_u16(),
                body = %body,
                "Token request rejected"
            );
            return Err(AuthError::token_rejected(status.as_u16(), body));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            AuthError::token_rejected(status.as_u16(), format!("malformed token response: {e}"))
        })?;
        let expires_in = parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let token = parsed.into_token(scopes, OffsetDateTime::now_utc())?;

        tracing::info!(
            token_type = %token.token_type,
            expires_in,
            scope = %token.scopes.join(" "),
            "Access token obtained"
        );

        Ok(token)
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("client_id", &self.signer.client_id())
            .field("token_url", &self.token_url)
            .field("default_scopes", &self.default_scopes)
            .field("margin", &self.margin)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn token_expiring_at(expires_at: OffsetDateTime) -> AccessToken {
        AccessToken::new("abc", "Bearer", vec![], expires_at)
    }

    #[test]
    fn test_usable_inside_margin_window() {
        let now = datetime!(2024-05-01 12:00:00 UTC);
        let margin = Duration::minutes(5);

        assert!(token_expiring_at(now + Duration::minutes(6)).is_usable_at(now, margin));
        assert!(!token_expiring_at(now + Duration::minutes(5)).is_usable_at(now, margin));
        assert!(!token_expiring_at(now + Duration::minutes(4)).is_usable_at(now, margin));
        assert!(!token_expiring_at(now - Duration::minutes(1)).is_usable_at(now, margin));
    }

    #[test]
    fn test_token_response_defaults() {
        let now = datetime!(2024-05-01 12:00:00 UTC);
        let response: TokenResponse = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        let requested = vec!["system/Patient.read".to_string()];
        let token = response.into_token(&requested, now).unwrap();

        assert_eq!(token.value(), "abc");
        assert_eq!(token.token_type(), "Bearer");
        assert_eq!(token.scopes(), requested.as_slice());
        assert_eq!(token.expires_at(), now + Duration::seconds(3600));
    }

    #[test]
    fn test_token_response_granted_scope() {
        let now = datetime!(2024-05-01 12:00:00 UTC);
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"abc","token_type":"bearer","expires_in":600,
                "scope":"system/Patient.read system/Observation.read"}"#,
        )
        .unwrap();
        let token = response.into_token(&[], now).unwrap();

        assert_eq!(token.token_type(), "bearer");
        assert_eq!(token.scopes().len(), 2);
        assert_eq!(token.expires_at(), now + Duration::seconds(600));
    }

    #[test]
    fn test_token_response_missing_access_token() {
        assert!(serde_json::from_str::<TokenResponse>(r#"{"expires_in":3600}"#).is_err());
    }

    #[test]
    fn test_debug_redacts_value() {
        let token = AccessToken::new(
            "super-secret",
            "Bearer",
            vec![],
            datetime!(2024-05-01 12:00:00 UTC),
        );
        assert!(!format!("{token:?}").contains("super-secret"));
    }
}
