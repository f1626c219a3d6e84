//! Authorization Code + PKCE flow through the system browser.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use super::callback::CallbackListener;
use super::discovery::DiscoveryDocument;
use super::error::ExchangeError;
use super::pkce::{generate_pkce, generate_state};
use super::provider::ProviderConfig;
use super::session::SessionStore;
use super::token::{TokenPair, post_token_form};

/// Default loopback redirect when none is configured.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:46421";

/// Opens the authorization URL for the user.
pub trait BrowserLauncher: Send + Sync {
    fn launch(&self, url: &Url) -> std::io::Result<()>;
}

/// Hands the URL to the platform's default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn launch(&self, url: &Url) -> std::io::Result<()> {
        open::that(url.as_str())
    }
}

/// Browser surfaces the platform could offer.
///
/// Only the system browser is driven; the embedded flag is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserCapability {
    pub system_browser: bool,
    pub embedded_view: bool,
}

impl BrowserCapability {
    pub fn detect() -> Self {
        Self::for_os(std::env::consts::OS)
    }

    fn for_os(os: &str) -> Self {
        Self {
            system_browser: true,
            embedded_view: os == "windows",
        }
    }
}

impl fmt::Display for BrowserCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "system_browser={} embedded_view={}",
            self.system_browser, self.embedded_view
        )
    }
}

#[derive(Clone)]
pub struct InteractivePkce {
    http: reqwest::Client,
    provider: Arc<ProviderConfig>,
    launcher: Arc<dyn BrowserLauncher>,
    timeout: Duration,
}

impl fmt::Debug for InteractivePkce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractivePkce")
            .field("provider", &self.provider)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl InteractivePkce {
    pub fn new(
        http: reqwest::Client,
        provider: Arc<ProviderConfig>,
        launcher: Arc<dyn BrowserLauncher>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            provider,
            launcher,
            timeout,
        }
    }

    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    /// Runs the browser flow and updates the session.
    ///
    /// On success the session is replaced; on any error or cancellation it
    /// is cleared.
    pub async fn exchange(
        &self,
        session: &SessionStore,
        cancel: &CancellationToken,
    ) -> Result<(), ExchangeError> {
        match self.run(cancel).await {
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

    async fn run(&self, cancel: &CancellationToken) -> Result<TokenPair, ExchangeError> {
        let discovery =
            DiscoveryDocument::fetch(&self.http, &self.provider.discovery_url(), cancel).await?;

        let pkce = generate_pkce();
        let state = generate_state();

        let configured = match self.provider.redirect_uri() {
            Some(uri) => uri.clone(),
            None => Url::parse(DEFAULT_REDIRECT_URI)
                .map_err(|e| ExchangeError::MalformedResponse(e.to_string()))?,
        };
        let listener = CallbackListener::bind(&configured).await?;
        let redirect_uri = listener.redirect_uri().clone();

        let auth_url = self.authorization_url(
            &discovery.authorization_endpoint,
            &redirect_uri,
            &state,
            &pkce.challenge,
        );
        tracing::info!(redirect_uri = %redirect_uri, "Opening browser for login");
        if let Err(e) = self.launcher.launch(&auth_url) {
            return Err(ExchangeError::NetworkUnavailable(format!(
                "failed to open browser: {e}"
            )));
        }

        let code = listener.wait_for_code(&state, self.timeout, cancel).await?;
        tracing::debug!("Received authorization code");

        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.provider.client_id()),
            ("code", code.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("code_verifier", pkce.verifier.as_str()),
        ];
        post_token_form(&self.http, &discovery.token_endpoint, &params, cancel).await
    }

    fn authorization_url(
        &self,
        endpoint: &Url,
        redirect_uri: &Url,
        state: &str,
        challenge: &str,
    ) -> Url {
        let mut url = endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", self.provider.client_id())
                .append_pair("redirect_uri", redirect_uri.as_str())
                .append_pair("scope", &self.provider.scopes().join(" "))
                .append_pair("state", state)
                .append_pair("code_challenge", challenge)
                .append_pair("code_challenge_method", "S256");
            if let Some(audience) = self.provider.audience() {
                query.append_pair("audience", audience);
            }
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::pkce::challenge_for;

    /// Stands in for the browser by following the redirect itself.
    struct FakeBrowser {
        callback_query: fn(&str) -> String,
        seen: Mutex<Option<Url>>,
    }

    impl FakeBrowser {
        fn new(callback_query: fn(&str) -> String) -> Arc<Self> {
            Arc::new(Self {
                callback_query,
                seen: Mutex::new(None),
            })
        }
    }

    impl BrowserLauncher for FakeBrowser {
        fn launch(&self, url: &Url) -> std::io::Result<()> {
            *self.seen.lock().unwrap() = Some(url.clone());
            let param = |name: &str| {
                url.query_pairs()
                    .find(|(k, _)| k == name)
                    .map(|(_, v)| v.into_owned())
                    .unwrap()
            };
            let mut redirect: Url = param("redirect_uri").parse().unwrap();
            redirect.set_query(Some(&(self.callback_query)(&param("state"))));
            tokio::spawn(async move {
                let _ = reqwest::get(redirect).await;
            });
            Ok(())
        }
    }

    async fn mount_discovery(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/realms/r/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "authorization_endpoint": format!("{}/realms/r/protocol/openid-connect/auth", server.uri()),
                "token_endpoint": format!("{}/realms/r/protocol/openid-connect/token", server.uri()),
            })))
            .mount(server)
            .await;
    }

    fn flow(server: &MockServer, launcher: Arc<dyn BrowserLauncher>) -> InteractivePkce {
        let provider = ProviderConfig::new(server.uri().parse().unwrap(), "r", "ui")
            .with_redirect_uri("http://localhost:0".parse().unwrap());
        InteractivePkce::new(
            reqwest::Client::new(),
            Arc::new(provider),
            launcher,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_full_flow_sets_session() {
        let server = MockServer::start().await;
        mount_discovery(&server).await;
        Mock::given(method("POST"))
            .and(path("/realms/r/protocol/openid-connect/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=granted"))
            .and(body_string_contains("code_verifier="))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"access_token":"abc"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let browser = FakeBrowser::new(|state| format!("code=granted&state={state}"));
        let session = SessionStore::new();
        flow(&server, browser.clone())
            .exchange(&session, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(session.access_token().as_deref(), Some("abc"));
        assert_eq!(session.snapshot().refresh_token(), None);

        let seen = browser.seen.lock().unwrap().clone().unwrap();
        let pairs: std::collections::HashMap<_, _> = seen.query_pairs().into_owned().collect();
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["client_id"], "ui");
        assert_eq!(pairs["scope"], "openid profile");
        assert_eq!(pairs["code_challenge_method"], "S256");
        assert_eq!(pairs["code_challenge"].len(), challenge_for("x").len());
    }

    #[tokio::test]
    async fn test_user_denial_is_cancellation() {
        let server = MockServer::start().await;
        mount_discovery(&server).await;

        let browser = FakeBrowser::new(|state| format!("error=access_denied&state={state}"));
        let session = SessionStore::new();
        session.replace("stale".into(), None);

        let err = flow(&server, browser)
            .exchange(&session, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::InteractionCancelled));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_state_mismatch_is_malformed() {
        let server = MockServer::start().await;
        mount_discovery(&server).await;

        let browser = FakeBrowser::new(|_| "code=granted&state=forged".to_string());
        let err = flow(&server, browser)
            .exchange(&SessionStore::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::MalformedResponse(_)));
    }

    #[test]
    fn test_capability_detection() {
        assert!(BrowserCapability::for_os("linux").system_browser);
        assert!(!BrowserCapability::for_os("linux").embedded_view);
        assert!(BrowserCapability::for_os("windows").embedded_view);
    }
}
