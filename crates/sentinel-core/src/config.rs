//! Configuration management for Sentinel.
//!
//! Loads configuration from ${SENTINEL_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::{LoginStrategy, ProviderConfig};

/// Environment variable that overrides `environment` from the config file.
pub const ENVIRONMENT_ENV_VAR: &str = "SENTINEL_ENV";

/// Deployment environment.
///
/// Development-only behavior (relaxed TLS, the token-mint endpoint) is gated
/// on this value and never enabled in production. Development must be
/// selected explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        matches!(self, Environment::Development)
    }

    /// Parses an environment name (case-insensitive, accepts short forms).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }
}

/// Keycloak connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeycloakConfig {
    /// Base URL of the Keycloak server (without `/realms/...`).
    pub authority: String,
    pub realm: String,
    /// Public client used by the desktop shell.
    pub client_id: String,
    /// Expected token audience (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    /// Loopback redirect URI for the interactive flow.
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    /// Client used by the development token-mint endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_token_client_id: Option<String>,
}

impl KeycloakConfig {
    const DEFAULT_AUTHORITY: &str = "https://localhost:8443";
    const DEFAULT_REALM: &str = "database-sentinel";
    const DEFAULT_CLIENT_ID: &str = "database-sentinel-ui";
    const DEFAULT_REDIRECT_URI: &str = "http://localhost:46421";

    /// Client id used by the token-mint endpoint.
    pub fn dev_token_client_id(&self) -> &str {
        self.dev_token_client_id
            .as_deref()
            .unwrap_or(self.client_id.as_str())
    }
}

impl Default for KeycloakConfig {
    fn default() -> Self {
        Self {
            authority: Self::DEFAULT_AUTHORITY.to_string(),
            realm: Self::DEFAULT_REALM.to_string(),
            client_id: Self::DEFAULT_CLIENT_ID.to_string(),
            audience: None,
            redirect_uri: Self::DEFAULT_REDIRECT_URI.to_string(),
            scopes: vec!["openid".to_string(), "profile".to_string()],
            dev_token_client_id: None,
        }
    }
}

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for Sentinel configuration and data directories.
    //!
    //! SENTINEL_HOME resolution order:
    //! 1. SENTINEL_HOME environment variable (if set)
    //! 2. ~/.config/sentinel (default)

    use std::path::PathBuf;

    /// Returns the Sentinel home directory.
    ///
    /// Checks SENTINEL_HOME env var first, falls back to ~/.config/sentinel,
    /// and finally to `.sentinel` in the working directory.
    pub fn sentinel_home() -> PathBuf {
        if let Ok(home) = std::env::var("SENTINEL_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".sentinel"),
            |h| h.join(".config").join("sentinel"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        sentinel_home().join("config.toml")
    }

    /// Returns the directory for rolling log files.
    pub fn logs_dir() -> PathBuf {
        sentinel_home().join("logs")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub environment: Environment,

    /// Which grant the login surface uses.
    pub login_strategy: LoginStrategy,

    /// Skip TLS validation for Keycloak (development only)
    pub accept_invalid_certs: bool,

    /// Present the dashboard signed-out when an interactive login is cancelled
    pub fallback_to_main_on_cancel: bool,

    /// Upper bound for the browser round-trip, in seconds
    pub interactive_timeout_secs: u64,

    pub keycloak: KeycloakConfig,
}

impl Config {
    const DEFAULT_INTERACTIVE_TIMEOUT_SECS: u64 = 300;

    /// Loads configuration from the default config path.
    ///
    /// Applies the `SENTINEL_ENV` override after reading the file.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&paths::config_path())?;
        if let Ok(value) = std::env::var(ENVIRONMENT_ENV_VAR) {
            config.apply_environment_override(&value)?;
        }
        Ok(config)
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Overrides the environment from an external value (e.g. `SENTINEL_ENV`).
    ///
    /// # Errors
    /// Returns an error if the value is not a known environment name.
    pub fn apply_environment_override(&mut self, value: &str) -> Result<()> {
        self.environment = Environment::parse(value).with_context(|| {
            format!("Invalid {ENVIRONMENT_ENV_VAR} value '{value}' (expected development or production)")
        })?;
        Ok(())
    }

    /// Creates a config file from the commented template.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Whether certificate validation may be skipped for this configuration.
    ///
    /// The flag is only honored in development.
    pub fn allows_invalid_certs(&self) -> bool {
        self.accept_invalid_certs && self.environment.is_development()
    }

    pub fn interactive_timeout(&self) -> Duration {
        Duration::from_secs(self.interactive_timeout_secs)
    }

    /// Resolves the immutable provider settings shared by the exchangers.
    ///
    /// # Errors
    /// Returns an error if the authority or redirect URI is not a valid URL.
    pub fn provider_config(&self) -> Result<ProviderConfig> {
        let keycloak = &self.keycloak;
        let authority = Url::parse(&keycloak.authority)
            .with_context(|| format!("Invalid keycloak.authority '{}'", keycloak.authority))?;
        let redirect_uri = Url::parse(&keycloak.redirect_uri).with_context(|| {
            format!("Invalid keycloak.redirect_uri '{}'", keycloak.redirect_uri)
        })?;

        let mut provider = ProviderConfig::new(authority, &keycloak.realm, &keycloak.client_id)
            .with_redirect_uri(redirect_uri)
            .with_scopes(keycloak.scopes.clone());
        if let Some(audience) = keycloak.audience.as_deref() {
            provider = provider.with_audience(audience);
        }
        Ok(provider)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            login_strategy: LoginStrategy::default(),
            accept_invalid_certs: false,
            fallback_to_main_on_cancel: true,
            interactive_timeout_secs: Self::DEFAULT_INTERACTIVE_TIMEOUT_SECS,
            keycloak: KeycloakConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.login_strategy, LoginStrategy::Password);
        assert_eq!(config.keycloak.realm, "database-sentinel");
        assert_eq!(config.keycloak.scopes, vec!["openid", "profile"]);
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(
            &config_path,
            "login_strategy = \"interactive\"\n[keycloak]\nrealm = \"ops\"\n",
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.login_strategy, LoginStrategy::Interactive);
        assert_eq!(config.keycloak.realm, "ops");
        assert_eq!(config.keycloak.client_id, "database-sentinel-ui");
        assert!(config.fallback_to_main_on_cancel);
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let config: Config = toml::from_str(default_config_template()).unwrap();
        let defaults = Config::default();
        // The template opts into development explicitly.
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.login_strategy, defaults.login_strategy);
        assert_eq!(config.keycloak.authority, defaults.keycloak.authority);
        assert_eq!(config.keycloak.redirect_uri, defaults.keycloak.redirect_uri);
        assert_eq!(
            config.interactive_timeout_secs,
            defaults.interactive_timeout_secs
        );
    }

    #[test]
    fn test_init_creates_config_and_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();
        assert!(config_path.exists());

        let err = Config::init(&config_path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_development_is_never_implied() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "accept_invalid_certs = true\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert!(!config.environment.is_development());
        assert!(!config.allows_invalid_certs());
    }

    #[test]
    fn test_invalid_certs_only_allowed_in_development() {
        let mut config = Config {
            environment: Environment::Development,
            accept_invalid_certs: true,
            ..Config::default()
        };
        assert!(config.allows_invalid_certs());

        config.environment = Environment::Production;
        assert!(!config.allows_invalid_certs());
    }

    #[test]
    fn test_environment_override() {
        let mut config = Config::default();
        config.apply_environment_override("PROD").unwrap();
        assert_eq!(config.environment, Environment::Production);

        assert!(config.apply_environment_override("staging").is_err());
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn test_provider_config_resolves_endpoints() {
        let mut config = Config::default();
        config.keycloak.authority = "https://sso.example.com/".to_string();
        config.keycloak.audience = Some("sentinel-api".to_string());

        let provider = config.provider_config().unwrap();
        assert_eq!(
            provider.token_endpoint().as_str(),
            "https://sso.example.com/realms/database-sentinel/protocol/openid-connect/token"
        );
        assert_eq!(provider.audience(), Some("sentinel-api"));
        assert_eq!(
            provider.redirect_uri().map(Url::as_str),
            Some("http://localhost:46421/")
        );
    }

    #[test]
    fn test_provider_config_rejects_invalid_authority() {
        let mut config = Config::default();
        config.keycloak.authority = "not a url".to_string();

        let err = config.provider_config().unwrap_err();
        assert!(err.to_string().contains("keycloak.authority"));
    }
}
