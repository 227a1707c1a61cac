//! Aggregation settings.

use serde::{Deserialize, Serialize};

use chartlink_client::ConfigError;

/// Settings for [`PatientRecordAggregator`](crate::PatientRecordAggregator).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Section searches allowed in flight at once.
    pub max_concurrency: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self { max_concurrency: 4 }
    }
}

impl AggregatorConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `max_concurrency` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "aggregator.max_concurrency must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_and_validation() {
        assert_eq!(AggregatorConfig::default().max_concurrency, 4);
        assert!(AggregatorConfig::default().validate().is_ok());
        assert!(AggregatorConfig { max_concurrency: 0 }.validate().is_err());
    }
}
