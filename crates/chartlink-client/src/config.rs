//! Resource client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use chartlink_auth::ConfigError;

/// Settings for [`ResourceFetcher`](crate::ResourceFetcher).
///
/// # Example (TOML)
///
/// ```toml
/// [fetcher]
/// base_url = "https://fhir.example.org/api/FHIR/R4"
/// request_timeout = "30s"
/// page_size = 100
///
/// [fetcher.rate_limit]
/// max_requests = 10
/// period = "1s"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// FHIR base URL, without a trailing resource type.
    pub base_url: String,

    /// Timeout applied to every resource request.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Optional `_count` added to every search.
    pub page_size: Option<u32>,

    /// Optional client-side request rate limit.
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            request_timeout: Duration::from_secs(30),
            page_size: None,
            rate_limit: None,
        }
    }
}

/// Sliding-window request budget: at most `max_requests` per `period`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests allowed inside one window.
    pub max_requests: u32,

    /// Window length.
    #[serde(with = "humantime_serde")]
    pub period: Duration,
}

impl FetcherConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the base URL is empty and
    /// `ConfigError::InvalidValue` if:
    /// - the base URL is not an absolute http(s) URL
    /// - the request timeout or page size is zero
    /// - the rate limit allows zero requests or has a zero period
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("fetcher.base_url".to_string()));
        }

        let url = Url::parse(&self.base_url).map_err(|e| {
            ConfigError::InvalidValue(format!("fetcher.base_url '{}': {e}", self.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue(format!(
                "fetcher.base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "fetcher.request_timeout must be greater than zero".to_string(),
            ));
        }

        if self.page_size == Some(0) {
            return Err(ConfigError::InvalidValue(
                "fetcher.page_size must be greater than zero".to_string(),
            ));
        }

        if let Some(limit) = &self.rate_limit {
            if limit.max_requests == 0 {
                return Err(ConfigError::InvalidValue(
                    "fetcher.rate_limit.max_requests must be greater than zero".to_string(),
                ));
            }
            if limit.period.is_zero() {
                return Err(ConfigError::InvalidValue(
                    "fetcher.rate_limit.period must be greater than zero".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> FetcherConfig {
        FetcherConfig {
            base_url: "https://fhir.example.org/api/FHIR/R4".to_string(),
            ..FetcherConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = FetcherConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.page_size.is_none());
        assert!(config.rate_limit.is_none());
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_base_url() {
        let err = FetcherConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = valid_config();
        config.page_size = Some(0);
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.rate_limit = Some(RateLimitConfig {
            max_requests: 0,
            period: Duration::from_secs(1),
        });
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.base_url = "file:///tmp/fhir".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_rate_limit() {
        let json = r#"{
            "base_url": "https://fhir.example.org/R4",
            "page_size": 50,
            "rate_limit": { "max_requests": 10, "period": "1s" }
        }"#;
        let config: FetcherConfig = serde_json::from_str(json).unwrap();
        let limit = config.rate_limit.unwrap();
        assert_eq!(limit.max_requests, 10);
        assert_eq!(limit.period, Duration::from_secs(1));
        assert_eq!(config.page_size, Some(50));
    }
}
