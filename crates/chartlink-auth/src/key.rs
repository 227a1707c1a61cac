//! RSA private key loading for assertion signing.
//!
//! The key is read once at startup, either from an inline PEM value (usually
//! injected through the environment) or from a file. Inline PEM wins when
//! both are configured. Both PKCS#8 (`BEGIN PRIVATE KEY`) and PKCS#1
//! (`BEGIN RSA PRIVATE KEY`) encodings are accepted.

use std::fmt;
use std::path::{Path, PathBuf};

use jsonwebtoken::EncodingKey;
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;

/// Where the loaded key came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Inline PEM from configuration or environment.
    Inline,
    /// PEM file on disk.
    File(PathBuf),
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => write!(f, "inline PEM"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A validated RSA private key ready for RS384 signing.
///
/// Stateless after load. `Debug` never prints key material.
#[derive(Clone)]
pub struct KeyMaterial {
    encoding_key: EncodingKey,
    source: KeySource,
    modulus_bits: usize,
}

impl KeyMaterial {
    /// Parses a PEM-encoded RSA private key.
    ///
    /// PEM values whose line breaks arrived as literal `\n` sequences (a
    /// common artefact of single-line environment variables) are unescaped
    /// first.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeyLoad` if the value is not a PEM RSA private key.
    pub fn from_pem(pem: &str, source: KeySource) -> AuthResult<Self> {
        let pem = normalize_pem(pem);
        if pem.trim().is_empty() {
            return Err(AuthError::key_load(format!("empty private key ({source})")));
        }

        let private_key = RsaPrivateKey::from_pkcs8_pem(&pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(&pem))
            .map_err(|e| {
                AuthError::key_load(format!("invalid RSA private key ({source}): {e}"))
            })?;

        let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
            AuthError::key_load(format!("unusable RSA private key ({source}): {e}"))
        })?;

        let modulus_bits = private_key.size() * 8;
        tracing::debug!(source = %source, modulus_bits, "Loaded RSA private key");

        Ok(Self {
            encoding_key,
            source,
            modulus_bits,
        })
    }

    /// Reads and parses a PEM file.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeyLoad` if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> AuthResult<Self> {
        let path = path.as_ref();
        let pem = std::fs::read_to_string(path).map_err(|e| {
            AuthError::key_load(format!(
                "cannot read private key file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_pem(&pem, KeySource::File(path.to_path_buf()))
    }

    /// Loads the key named by the configuration, inline PEM first.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeyLoad` if no key source is configured or the
    /// configured key cannot be loaded.
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        if let Some(pem) = config
            .private_key_pem
            .as_deref()
            .filter(|pem| !pem.trim().is_empty())
        {
            return Self::from_pem(pem, KeySource::Inline);
        }

        match &config.private_key_path {
            Some(path) => Self::from_file(path),
            None => Err(AuthError::key_load(
                "no private key configured (set auth.private_key_pem or auth.private_key_path)",
            )),
        }
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// Where the key was loaded from.
    #[must_use]
    pub fn source(&self) -> &KeySource {
        &self.source
    }

    /// RSA modulus size in bits.
    #[must_use]
    pub fn modulus_bits(&self) -> usize {
        self.modulus_bits
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("source", &self.source)
            .field("modulus_bits", &self.modulus_bits)
            .finish_non_exhaustive()
    }
}

fn normalize_pem(pem: &str) -> String {
    if !pem.contains('\n') && pem.contains("\\n") {
        pem.replace("\\n", "\n")
    } else {
        pem.to_string()
    }
}
