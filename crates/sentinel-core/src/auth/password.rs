use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::attempt::Credentials;
use super::error::ExchangeError;
use super::provider::ProviderConfig;
use super::session::SessionStore;
use super::token::post_token_form;

/// Resource owner password grant against the realm token endpoint.
#[derive(Debug, Clone)]
pub struct PasswordGrant {
    http: reqwest::Client,
    provider: Arc<ProviderConfig>,
}

impl PasswordGrant {
    pub fn new(http: reqwest::Client, provider: Arc<ProviderConfig>) -> Self {
        Self { http, provider }
    }

    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    /// Exchanges credentials for tokens and updates the session.
    ///
    /// On success the session is replaced; on any error it is cleared.
    pub async fn exchange(
        &self,
        credentials: &Credentials,
        session: &SessionStore,
        cancel: &CancellationToken,
    ) -> Result<(), ExchangeError> {
        let result = self.request_tokens(credentials, cancel).await;
        match result {
            Ok(pair) => {
                session.replace(pair.access_token, pair.refresh_token);
                Ok(())
            }
            Err(err) => {
                session.clear();
                Err(err)
            }
        }
    }

    async fn request_tokens(
        &self,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> Result<super::token::TokenPair, ExchangeError> {
        if credentials.is_blank() {
            return Err(ExchangeError::CredentialsRejected {
                status: None,
                details: "username and password are required".into(),
            });
        }

        // Scope and audience only apply to the browser flow.
        let params = [
            ("grant_type", "password"),
            ("client_id", self.provider.client_id()),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ];

        let url = self.provider.token_endpoint();
        tracing::debug!(endpoint = %url, username = %credentials.username, "Password grant");
        post_token_form(&self.http, &url, &params, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn grant(server: &MockServer) -> PasswordGrant {
        let provider = ProviderConfig::new(server.uri().parse().unwrap(), "sentinel", "ui")
            .with_audience("sentinel-api");
        PasswordGrant::new(reqwest::Client::new(), Arc::new(provider))
    }

    #[tokio::test]
    async fn test_success_replaces_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/realms/sentinel/protocol/openid-connect/token"))
            .and(body_string_contains("client_id=ui"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"access_token":"abc","refresh_token":"def","token_type":"Bearer"}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let session = SessionStore::new();
        grant(&server)
            .exchange(
                &Credentials::new("alice", "secret"),
                &session,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.access_token(), Some("abc"));
        assert_eq!(snapshot.refresh_token(), Some("def"));
    }

    #[tokio::test]
    async fn test_form_carries_only_grant_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"access_token":"abc"}"#))
            .expect(1)
            .mount(&server)
            .await;

        grant(&server)
            .exchange(
                &Credentials::new("alice", "p&ss word"),
                &SessionStore::new(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let fields: Vec<(String, String)> = url::form_urlencoded::parse(&requests[0].body)
            .into_owned()
            .collect();
        assert_eq!(
            fields,
            vec![
                ("grant_type".to_string(), "password".to_string()),
                ("client_id".to_string(), "ui".to_string()),
                ("username".to_string(), "alice".to_string()),
                ("password".to_string(), "p&ss word".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_rejection_clears_previous_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string(r#"{"error":"invalid_grant"}"#),
            )
            .mount(&server)
            .await;

        let session = SessionStore::new();
        session.replace("stale".into(), None);

        let err = grant(&server)
            .exchange(
                &Credentials::new("alice", "wrong"),
                &session,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::CredentialsRejected { .. }));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_blank_credentials_never_hit_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = grant(&server)
            .exchange(
                &Credentials::new("", "secret"),
                &SessionStore::new(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::CredentialsRejected { status: None, .. }
        ));
    }
}
