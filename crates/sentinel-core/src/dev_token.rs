//! Development token-mint endpoint.
//!
//! `POST /dev/token` trades a username and password for a Keycloak access
//! token so API clients can be exercised without the desktop shell. Every
//! request is answered with 404 outside the development environment.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::auth::ProviderConfig;
use crate::config::{Config, Environment};

pub const DEV_TOKEN_ROUTE: &str = "/dev/token";

/// Shared state for the token-mint handler.
#[derive(Debug, Clone)]
pub struct DevTokenState {
    http: reqwest::Client,
    provider: Arc<ProviderConfig>,
    environment: Environment,
}

impl DevTokenState {
    pub fn new(http: reqwest::Client, provider: Arc<ProviderConfig>, environment: Environment) -> Self {
        Self {
            http,
            provider,
            environment,
        }
    }

    /// Builds state using `dev_token_client_id` (falling back to `client_id`).
    ///
    /// # Errors
    /// Returns an error if the configured authority is not a valid URL.
    pub fn from_config(config: &Config, http: reqwest::Client) -> Result<Self> {
        let keycloak = &config.keycloak;
        let authority = url::Url::parse(&keycloak.authority)
            .with_context(|| format!("Invalid keycloak.authority '{}'", keycloak.authority))?;
        let provider =
            ProviderConfig::new(authority, &keycloak.realm, keycloak.dev_token_client_id());
        Ok(Self::new(http, Arc::new(provider), config.environment))
    }
}

#[derive(Debug, Default, Deserialize)]
struct TokenRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
struct TokenReply {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct ErrorReply {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

fn error_reply(status: StatusCode, error: &'static str, details: Option<String>) -> Response {
    (status, Json(ErrorReply { error, details })).into_response()
}

pub fn router(state: DevTokenState) -> Router {
    Router::new()
        .route(DEV_TOKEN_ROUTE, post(mint_token))
        .with_state(state)
}

/// Handler for `POST /dev/token`.
async fn mint_token(State(state): State<DevTokenState>, body: Bytes) -> Response {
    if !state.environment.is_development() {
        return StatusCode::NOT_FOUND.into_response();
    }

    let request: TokenRequest = serde_json::from_slice(&body).unwrap_or_default();
    if request.username.trim().is_empty() || request.password.trim().is_empty() {
        return error_reply(
            StatusCode::BAD_REQUEST,
            "Username and Password are required.",
            None,
        );
    }

    let params = [
        ("grant_type", "password"),
        ("client_id", state.provider.client_id()),
        ("username", request.username.as_str()),
        ("password", request.password.as_str()),
    ];
    let response = match state
        .http
        .post(state.provider.token_endpoint())
        .form(&params)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(error = %err, "Keycloak unreachable");
            return error_reply(StatusCode::BAD_GATEWAY, "Unable to reach Keycloak.", None);
        }
    };

    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to read Keycloak response");
            return error_reply(StatusCode::BAD_GATEWAY, "Unable to reach Keycloak.", None);
        }
    };

    if !status.is_success() {
        tracing::info!(%status, username = %request.username, "Keycloak rejected token request");
        return error_reply(
            StatusCode::BAD_REQUEST,
            "Keycloak returned an error.",
            Some(text),
        );
    }

    let access_token = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|value| {
            value
                .get("access_token")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .filter(|token| !token.is_empty());

    match access_token {
        Some(access_token) => {
            tracing::info!(username = %request.username, "Minted development token");
            Json(TokenReply { access_token }).into_response()
        }
        None => error_reply(
            StatusCode::BAD_REQUEST,
            "No access_token in Keycloak response.",
            Some(text),
        ),
    }
}

/// Serves the endpoint until `shutdown` is cancelled.
///
/// # Errors
/// Returns an error if the server fails while accepting connections.
pub async fn serve(
    listener: TcpListener,
    state: DevTokenState,
    shutdown: CancellationToken,
) -> Result<()> {
    let addr = listener.local_addr().context("Failed to read bound address")?;
    tracing::info!(%addr, environment = ?state.environment, "Dev token endpoint listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("Dev token server failed")
}
