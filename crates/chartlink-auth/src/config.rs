//! Backend-services client configuration.
//!
//! Everything the token issuer needs to authenticate unattended against a
//! provider's token endpoint: the registered client id, the token endpoint,
//! where to find the private key and how long tokens are trusted.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use chartlink_core::default_system_scopes;

/// Client credentials and token-lifecycle settings.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// client_id = "c0ffee-backend"
/// token_url = "https://fhir.example.org/oauth2/token"
/// private_key_path = "keys/backend.pem"
/// token_margin = "5m"
/// request_timeout = "30s"
/// ```
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Client id registered with the provider. Used as `iss`, `sub` and the
    /// JWT header `kid` of every assertion.
    pub client_id: String,

    /// Token endpoint URL. Also the assertion audience.
    pub token_url: String,

    /// Inline PEM-encoded RSA private key. Takes precedence over
    /// `private_key_path` when both are set.
    #[serde(skip_serializing)]
    pub private_key_pem: Option<String>,

    /// Path to a PEM-encoded RSA private key file.
    pub private_key_path: Option<PathBuf>,

    /// Scopes requested when the caller names none.
    pub scopes: Vec<String>,

    /// A cached token is only handed out while `now < expiry - token_margin`.
    #[serde(with = "humantime_serde")]
    pub token_margin: Duration,

    /// Timeout applied to every token request.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            token_url: String::new(),
            private_key_pem: None,
            private_key_path: None,
            scopes: default_system_scopes(),
            token_margin: Duration::from_secs(300),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("client_id", &self.client_id)
            .field("token_url", &self.token_url)
            .field(
                "private_key_pem",
                &self.private_key_pem.as_ref().map(|_| "<redacted>"),
            )
            .field("private_key_path", &self.private_key_path)
            .field("scopes", &self.scopes)
            .field("token_margin", &self.token_margin)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the client id, token URL or key
    /// source is absent, and `ConfigError::InvalidValue` if:
    /// - the token URL is not an absolute http(s) URL
    /// - the request timeout is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::Missing("auth.client_id".to_string()));
        }

        if self.token_url.trim().is_empty() {
            return Err(ConfigError::Missing("auth.token_url".to_string()));
        }

        let url = Url::parse(&self.token_url).map_err(|e| {
            ConfigError::InvalidValue(format!("auth.token_url '{}': {e}", self.token_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue(format!(
                "auth.token_url must use http or https, got '{}'",
                url.scheme()
            )));
        }

        let has_inline = self
            .private_key_pem
            .as_deref()
            .is_some_and(|pem| !pem.trim().is_empty());
        if !has_inline && self.private_key_path.is_none() {
            return Err(ConfigError::Missing(
                "auth.private_key_pem or auth.private_key_path".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "auth.request_timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Scopes to request when the caller names none.
    ///
    /// Falls back to the nine `system/<Resource>.read` scopes when the
    /// configured list is empty.
    #[must_use]
    pub fn effective_scopes(&self) -> Vec<String> {
        if self.scopes.is_empty() {
            default_system_scopes()
        } else {
            self.scopes.clone()
        }
    }
}
