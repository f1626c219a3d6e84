use std::fmt;

use serde::{Deserialize, Serialize};

/// Message shown when the password form is submitted incomplete.
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Please enter username and password.";

/// OAuth2 grant used to obtain the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoginStrategy {
    /// Resource owner password grant.
    #[default]
    Password,
    /// Authorization Code + PKCE in the browser.
    Interactive,
}

impl fmt::Display for LoginStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginStrategy::Password => f.write_str("password"),
            LoginStrategy::Interactive => f.write_str("interactive"),
        }
    }
}

/// Username/password pair for the password grant.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// True if either field is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.username.trim().is_empty() || self.password.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Pending,
    Succeeded,
    FailedCredentials,
    FailedNetwork,
    FailedMalformed,
    Cancelled,
}

/// State of one login invocation. Lives only for the duration of the call.
#[derive(Debug)]
pub struct LoginAttempt {
    strategy: LoginStrategy,
    credentials: Option<Credentials>,
    status: AttemptStatus,
}

impl LoginAttempt {
    /// Starts a pending attempt. Credentials are dropped for the
    /// interactive strategy, where the provider collects them itself.
    pub fn new(strategy: LoginStrategy, credentials: Option<Credentials>) -> Self {
        let credentials = match strategy {
            LoginStrategy::Password => credentials,
            LoginStrategy::Interactive => None,
        };
        Self {
            strategy,
            credentials,
            status: AttemptStatus::Pending,
        }
    }

    pub fn strategy(&self) -> LoginStrategy {
        self.strategy
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    /// Password attempts need non-blank credentials before any network call.
    pub fn has_required_credentials(&self) -> bool {
        match self.strategy {
            LoginStrategy::Password => self.credentials.as_ref().is_some_and(|c| !c.is_blank()),
            LoginStrategy::Interactive => true,
        }
    }

    pub(crate) fn finish(&mut self, status: AttemptStatus) {
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_credentials() {
        assert!(Credentials::new("", "secret").is_blank());
        assert!(Credentials::new("alice", "   ").is_blank());
        assert!(!Credentials::new("alice", "secret").is_blank());
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("alice", "hunter2"));
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_interactive_attempt_drops_credentials() {
        let attempt = LoginAttempt::new(
            LoginStrategy::Interactive,
            Some(Credentials::new("alice", "secret")),
        );
        assert!(attempt.credentials().is_none());
        assert!(attempt.has_required_credentials());
        assert_eq!(attempt.status(), AttemptStatus::Pending);
    }

    #[test]
    fn test_password_attempt_requires_credentials() {
        assert!(!LoginAttempt::new(LoginStrategy::Password, None).has_required_credentials());
        assert!(
            !LoginAttempt::new(LoginStrategy::Password, Some(Credentials::new("a", "")))
                .has_required_credentials()
        );
        assert!(
            LoginAttempt::new(LoginStrategy::Password, Some(Credentials::new("a", "b")))
                .has_required_credentials()
        );
    }

    #[test]
    fn test_strategy_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            strategy: LoginStrategy,
        }
        let parsed: Wrapper = toml::from_str("strategy = \"interactive\"").unwrap();
        assert_eq!(parsed.strategy, LoginStrategy::Interactive);
        assert_eq!(LoginStrategy::Password.to_string(), "password");
    }
}
