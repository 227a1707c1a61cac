//! Authentication error types.
//!
//! This module defines the errors raised while loading key material,
//! signing client assertions and exchanging them for access tokens.

/// Errors that can occur while obtaining an access token.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The private key is missing, unreadable or cannot be parsed.
    ///
    /// This is fatal: no token can ever be obtained without a usable key.
    #[error("Key load error: {message}")]
    KeyLoad {
        /// Description of why the key could not be loaded.
        message: String,
    },

    /// The client assertion could not be built or signed.
    #[error("Signing error: {message}")]
    Signing {
        /// Description of the signing failure.
        message: String,
    },

    /// The token endpoint rejected the request or could not be reached.
    #[error("Token request failed{}: {message}", format_status(.status))]
    TokenRequest {
        /// HTTP status returned by the token endpoint, if any response arrived.
        status: Option<u16>,
        /// Truncated response body or transport error description.
        message: String,
    },

    /// The auth configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `KeyLoad` error.
    #[must_use]
    pub fn key_load(message: impl Into<String>) -> Self {
        Self::KeyLoad {
            message: message.into(),
        }
    }

    /// Creates a new `Signing` error.
    #[must_use]
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    /// Creates a `TokenRequest` error for a non-success HTTP response.
    #[must_use]
    pub fn token_rejected(status: u16, message: impl Into<String>) -> Self {
        Self::TokenRequest {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates a `TokenRequest` error for a transport-level failure.
    #[must_use]
    pub fn token_transport(message: impl Into<String>) -> Self {
        Self::TokenRequest {
            status: None,
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` for errors that must stop the process at startup.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::KeyLoad { .. } | Self::Configuration { .. })
    }

    /// HTTP status reported by the token endpoint, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TokenRequest { status, .. } => *status,
            _ => None,
        }
    }
}

fn format_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                Self::key_load(err.to_string())
            }
            _ => Self::signing(err.to_string()),
        }
    }
}
