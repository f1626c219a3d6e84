use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::error::ExchangeError;

/// The subset of the OIDC discovery document the interactive flow needs.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DiscoveryDocument {
    pub issuer: Option<String>,
    pub authorization_endpoint: Url,
    pub token_endpoint: Url,
}

impl DiscoveryDocument {
    pub async fn fetch(
        http: &reqwest::Client,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<Self, ExchangeError> {
        tracing::debug!(%url, "Fetching OIDC discovery document");
        let request = http.get(url.clone()).send();
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ExchangeError::InteractionCancelled),
            result = request => result.map_err(|e| ExchangeError::transport(&e))?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(ExchangeError::NetworkUnavailable(format!(
                "discovery returned HTTP {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::transport(&e))?;
        serde_json::from_str(&body)
            .map_err(|e| ExchangeError::MalformedResponse(format!("invalid discovery document: {e}")))
    }
}
