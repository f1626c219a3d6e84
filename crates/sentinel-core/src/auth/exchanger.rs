use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use super::attempt::{LoginAttempt, LoginStrategy};
use super::error::ExchangeError;
use super::interactive::{BrowserLauncher, InteractivePkce};
use super::password::PasswordGrant;
use super::session::SessionStore;
use crate::config::Config;

/// The token acquisition strategy, fixed when the login flow is built.
#[derive(Debug, Clone)]
pub enum TokenExchanger {
    Password(PasswordGrant),
    Interactive(InteractivePkce),
}

impl TokenExchanger {
    /// Builds the exchanger selected by `config.login_strategy`.
    pub fn from_config(
        config: &Config,
        http: reqwest::Client,
        launcher: Arc<dyn BrowserLauncher>,
    ) -> Result<Self> {
        let provider = Arc::new(config.provider_config()?);
        Ok(match config.login_strategy {
            LoginStrategy::Password => Self::Password(PasswordGrant::new(http, provider)),
            LoginStrategy::Interactive => Self::Interactive(InteractivePkce::new(
                http,
                provider,
                launcher,
                config.interactive_timeout(),
            )),
        })
    }

    pub fn strategy(&self) -> LoginStrategy {
        match self {
            Self::Password(_) => LoginStrategy::Password,
            Self::Interactive(_) => LoginStrategy::Interactive,
        }
    }

    /// Authority shown in network error messages.
    pub fn authority(&self) -> String {
        let provider = match self {
            Self::Password(grant) => grant.provider(),
            Self::Interactive(flow) => flow.provider(),
        };
        provider.authority().as_str().trim_end_matches('/').to_string()
    }

    pub async fn exchange(
        &self,
        attempt: &LoginAttempt,
        session: &SessionStore,
        cancel: &CancellationToken,
    ) -> Result<(), ExchangeError> {
        match self {
            Self::Password(grant) => match attempt.credentials() {
                Some(credentials) => grant.exchange(credentials, session, cancel).await,
                None => {
                    session.clear();
                    Err(ExchangeError::CredentialsRejected {
                        status: None,
                        details: "username and password are required".into(),
                    })
                }
            },
            Self::Interactive(flow) => flow.exchange(session, cancel).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::interactive::SystemBrowser;

    #[test]
    fn test_from_config_follows_strategy() {
        let mut config = Config::default();
        let http = reqwest::Client::new();

        let exchanger =
            TokenExchanger::from_config(&config, http.clone(), Arc::new(SystemBrowser)).unwrap();
        assert_eq!(exchanger.strategy(), LoginStrategy::Password);
        assert_eq!(exchanger.authority(), "https://localhost:8443");

        config.login_strategy = LoginStrategy::Interactive;
        let exchanger = TokenExchanger::from_config(&config, http, Arc::new(SystemBrowser)).unwrap();
        assert_eq!(exchanger.strategy(), LoginStrategy::Interactive);
    }

    #[tokio::test]
    async fn test_password_without_credentials_is_rejected() {
        let exchanger = TokenExchanger::from_config(
            &Config::default(),
            reqwest::Client::new(),
            Arc::new(SystemBrowser),
        )
        .unwrap();
        let session = SessionStore::new();
        let attempt = LoginAttempt::new(LoginStrategy::Password, None);

        let err = exchanger
            .exchange(&attempt, &session, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::CredentialsRejected { .. }));
    }
}
