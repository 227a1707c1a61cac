use serde::{Deserialize, Serialize};

use chartlink_auth::{AuthConfig, ConfigError};
use chartlink_client::FetcherConfig;
use chartlink_record::AggregatorConfig;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "chartlink.toml";

/// Prefix for environment overrides, e.g. `CHARTLINK__AUTH__CLIENT_ID`.
pub const ENV_PREFIX: &str = "CHARTLINK";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub fetcher: FetcherConfig,
    pub aggregator: AggregatorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Validates every section needed to talk to the provider.
    ///
    /// The fetcher section is checked separately by
    /// [`ResourceFetcher::new`](chartlink_client::ResourceFetcher::new) so the
    /// `token` command works without a FHIR base URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth.validate()?;
        self.aggregator.validate()?;
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "logging.level must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

pub mod loader {
    use super::{AppConfig, DEFAULT_CONFIG_FILE, ENV_PREFIX};
    use anyhow::{Context, Result};
    use config::{Config, Environment, File, FileFormat, Map};
    use std::path::Path;

    /// Loads the optional TOML file, then `CHARTLINK__*` environment overrides.
    ///
    /// An explicit `path` must exist; the default file is skipped when absent.
    pub fn load_config(path: Option<&str>) -> Result<AppConfig> {
        load_with_env(path, None)
    }

    /// Like [`load_config`], with the environment replaced by `env` when given.
    pub fn load_with_env(path: Option<&str>, env: Option<Map<String, String>>) -> Result<AppConfig> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                builder = builder.add_source(File::new(p, FileFormat::Toml).required(true));
            }
            None => {
                if Path::new(DEFAULT_CONFIG_FILE).exists() {
                    builder = builder.add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml));
                }
            }
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .separator("__")
                .source(env),
        );

        let merged: AppConfig = builder
            .build()
            .context("config build error")?
            .try_deserialize()
            .context("config deserialize error")?;
        merged.validate()?;
        Ok(merged)
    }
}
