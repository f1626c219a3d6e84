use anyhow::{Context, Result};

use crate::config::Config;

const USER_AGENT: &str = concat!("database-sentinel/", env!("CARGO_PKG_VERSION"));

/// Builds the shared HTTP client used by every exchange.
///
/// Certificate validation is only relaxed when the environment is
/// development and `accept_invalid_certs` is set.
///
/// # Errors
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_client(config: &Config) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);

    if config.allows_invalid_certs() {
        tracing::warn!("TLS certificate validation is disabled (development environment)");
        builder = builder.danger_accept_invalid_certs(true);
    } else if config.accept_invalid_certs {
        tracing::warn!(
            environment = ?config.environment,
            "Ignoring accept_invalid_certs outside the development environment"
        );
    }

    builder.build().context("Failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[test]
    fn test_build_client_in_both_environments() {
        let mut config = Config {
            environment: Environment::Development,
            accept_invalid_certs: true,
            ..Config::default()
        };
        assert!(build_client(&config).is_ok());

        config.environment = Environment::Production;
        assert!(!config.allows_invalid_certs());
        assert!(build_client(&config).is_ok());
    }
}
