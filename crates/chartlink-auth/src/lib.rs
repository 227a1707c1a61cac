//! # chartlink-auth
//!
//! Unattended client authentication for a clinical-records FHIR API using
//! SMART Backend Services: a signed JWT client assertion exchanged for a
//! bearer access token with the client-credentials grant.
//!
//! This crate provides:
//! - RSA private key loading from inline PEM or a file
//! - RS384 client assertion signing (RFC 7523)
//! - Access token issuance with an expiry-margin cache and single-flight refresh
//!
//! ## Modules
//!
//! - [`config`] - Client credentials and token-lifecycle configuration
//! - [`key`] - Private key loading
//! - [`assertion`] - Client assertion claims and signing
//! - [`token`] - Token issuance and caching
//! - [`error`] - Error types

pub mod assertion;
pub mod config;
pub mod error;
pub mod key;
pub mod token;

pub use assertion::{AssertionClaims, AssertionSigner};
pub use config::{AuthConfig, ConfigError};
pub use error::AuthError;
pub use key::{KeyMaterial, KeySource};
pub use token::{AccessToken, CLIENT_ASSERTION_TYPE, TokenIssuer, TokenResponse};

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use chartlink_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::assertion::AssertionSigner;
    pub use crate::config::{AuthConfig, ConfigError};
    pub use crate::error::AuthError;
    pub use crate::key::KeyMaterial;
    pub use crate::token::{AccessToken, TokenIssuer};
}
