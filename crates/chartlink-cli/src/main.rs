mod cli;
mod commands;
mod config;
mod observability;
mod output;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use chartlink_auth::{AuthError, ConfigError, TokenIssuer};
use chartlink_client::{ClientError, ResourceFetcher};

use cli::{Cli, Commands};
use output::print_error;

/// Exit status for failures detected before any network call.
const EXIT_STARTUP: i32 = 2;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(exit_code(&e));
    }
}

async fn run() -> Result<()> {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        return Err(e).context("Failed to load .env");
    }

    let cli = Cli::parse();
    let cfg = config::loader::load_config(cli.config.as_deref())?;
    observability::init_tracing_with_level(&cfg.logging.level);

    let issuer = Arc::new(TokenIssuer::from_config(&cfg.auth)?);
    tracing::debug!(client_id = %cfg.auth.client_id, "Token issuer ready");

    match &cli.command {
        Commands::Token(args) => {
            commands::token::token(&issuer, args).await?;
        }
        Commands::Get(args) => {
            let fetcher = ResourceFetcher::new(issuer, &cfg.fetcher)?;
            commands::fetch::get(&fetcher, args).await?;
        }
        Commands::SearchPatients(args) => {
            let fetcher = ResourceFetcher::new(issuer, &cfg.fetcher)?;
            commands::fetch::search_patients(&fetcher, args).await?;
        }
        Commands::Record(args) => {
            let fetcher = ResourceFetcher::new(issuer, &cfg.fetcher)?;
            commands::record::record(fetcher, &cfg.aggregator, args).await?;
        }
    }

    Ok(())
}

/// Bad configuration, base URLs and keys exit with 2; everything else with 1.
fn exit_code(err: &anyhow::Error) -> i32 {
    let startup = err
        .downcast_ref::<AuthError>()
        .is_some_and(AuthError::is_fatal)
        || err.downcast_ref::<ConfigError>().is_some()
        || err.downcast_ref::<::config::ConfigError>().is_some()
        || matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::InvalidUrl { .. })
        );
    if startup { EXIT_STARTUP } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_load_failure_exits_with_startup_code() {
        let err = anyhow::Error::from(AuthError::key_load("no PEM data"));
        assert_eq!(exit_code(&err), EXIT_STARTUP);

        let err = anyhow::Error::from(ConfigError::Missing("auth.client_id".to_string()))
            .context("config");
        assert_eq!(exit_code(&err), EXIT_STARTUP);
    }

    #[test]
    fn test_runtime_failures_exit_with_one() {
        let err = anyhow::Error::from(AuthError::token_rejected(400, "invalid_client"));
        assert_eq!(exit_code(&err), 1);

        let err = anyhow::anyhow!("Record aggregation timed out");
        assert_eq!(exit_code(&err), 1);
    }
}
