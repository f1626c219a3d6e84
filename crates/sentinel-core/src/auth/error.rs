use thiserror::Error;

use super::attempt::AttemptStatus;

/// Failure of a token exchange.
///
/// Every variant leaves the session cleared.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Bad username/password or any non-2xx provider response.
    #[error("credentials rejected: {details}")]
    CredentialsRejected {
        status: Option<u16>,
        /// Opaque provider response body.
        details: String,
    },
    /// Transport failure or no usable response.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),
    /// A response arrived but a required field was missing or invalid.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// The user aborted the interactive flow.
    #[error("interaction cancelled")]
    InteractionCancelled,
}

/// Error kinds, used to key user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CredentialsRejected,
    NetworkUnavailable,
    MalformedResponse,
    InteractionCancelled,
}

impl ErrorKind {
    /// Short message shown next to the login control.
    pub fn user_message(self, authority: &str) -> String {
        match self {
            ErrorKind::CredentialsRejected => {
                "Login failed. Check your username and password.".to_string()
            }
            ErrorKind::NetworkUnavailable => {
                format!("Unable to reach the login server at {authority}.")
            }
            ErrorKind::MalformedResponse => {
                "The login server returned an unexpected response.".to_string()
            }
            ErrorKind::InteractionCancelled => "Login was cancelled.".to_string(),
        }
    }

    pub fn attempt_status(self) -> AttemptStatus {
        match self {
            ErrorKind::CredentialsRejected => AttemptStatus::FailedCredentials,
            ErrorKind::NetworkUnavailable => AttemptStatus::FailedNetwork,
            ErrorKind::MalformedResponse => AttemptStatus::FailedMalformed,
            ErrorKind::InteractionCancelled => AttemptStatus::Cancelled,
        }
    }
}

impl ExchangeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExchangeError::CredentialsRejected { .. } => ErrorKind::CredentialsRejected,
            ExchangeError::NetworkUnavailable(_) => ErrorKind::NetworkUnavailable,
            ExchangeError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            ExchangeError::InteractionCancelled => ErrorKind::InteractionCancelled,
        }
    }

    pub(crate) fn transport(err: &reqwest::Error) -> Self {
        if err.is_decode() {
            ExchangeError::MalformedResponse(err.to_string())
        } else {
            ExchangeError::NetworkUnavailable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_status_mapping() {
        let err = ExchangeError::CredentialsRejected {
            status: Some(401),
            details: "{\"error\":\"invalid_grant\"}".into(),
        };
        assert_eq!(err.kind(), ErrorKind::CredentialsRejected);
        assert_eq!(
            err.kind().attempt_status(),
            AttemptStatus::FailedCredentials
        );

        assert_eq!(
            ExchangeError::InteractionCancelled.kind().attempt_status(),
            AttemptStatus::Cancelled
        );
        assert_eq!(
            ExchangeError::NetworkUnavailable("refused".into())
                .kind()
                .attempt_status(),
            AttemptStatus::FailedNetwork
        );
    }

    #[test]
    fn test_network_message_names_authority() {
        let message = ErrorKind::NetworkUnavailable.user_message("https://localhost:8443");
        assert_eq!(
            message,
            "Unable to reach the login server at https://localhost:8443."
        );
    }
}
