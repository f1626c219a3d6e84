use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::error::ExchangeError;

/// Tokens returned by a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// POSTs a form-encoded token request and classifies the outcome.
///
/// Only a failure to get a response at all is a network error; every
/// non-2xx status that did arrive is a rejection carrying the raw body.
pub(crate) async fn post_token_form(
    http: &reqwest::Client,
    url: &Url,
    params: &[(&str, &str)],
    cancel: &CancellationToken,
) -> Result<TokenPair, ExchangeError> {
    let request = http.post(url.clone()).form(params).send();

    let response = tokio::select! {
        _ = cancel.cancelled() => return Err(ExchangeError::InteractionCancelled),
        result = request => result.map_err(|e| ExchangeError::transport(&e))?,
    };

    let status = response.status();
    let body = tokio::select! {
        _ = cancel.cancelled() => return Err(ExchangeError::InteractionCancelled),
        result = response.text() => result.map_err(|e| ExchangeError::transport(&e))?,
    };

    if !status.is_success() {
        return Err(ExchangeError::CredentialsRejected {
            status: Some(status.as_u16()),
            details: body,
        });
    }

    parse_token_response(&body)
}

fn parse_token_response(body: &str) -> Result<TokenPair, ExchangeError> {
    let parsed: TokenResponse = serde_json::from_str(body)
        .map_err(|e| ExchangeError::MalformedResponse(format!("invalid token JSON: {e}")))?;

    let access_token = parsed
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ExchangeError::MalformedResponse("no access_token in response".into()))?;

    Ok(TokenPair {
        access_token,
        refresh_token: parsed.refresh_token.filter(|t| !t.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn token_url(server: &MockServer) -> Url {
        format!("{}/token", server.uri()).parse().unwrap()
    }

    #[test]
    fn test_parse_token_response() {
        let pair = parse_token_response(r#"{"access_token":"abc","refresh_token":"def"}"#).unwrap();
        assert_eq!(pair.access_token, "abc");
        assert_eq!(pair.refresh_token.as_deref(), Some("def"));

        let pair = parse_token_response(r#"{"access_token":"abc","refresh_token":""}"#).unwrap();
        assert_eq!(pair.refresh_token, None);
    }

    #[test]
    fn test_parse_rejects_missing_or_empty_access_token() {
        for body in [r#"{"token_type":"bearer"}"#, r#"{"access_token":""}"#, "not json"] {
            let err = parse_token_response(body).unwrap_err();
            assert!(matches!(err, ExchangeError::MalformedResponse(_)), "{body}");
        }
    }

    #[tokio::test]
    async fn test_post_sends_form_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=password"))
            .and(body_string_contains("username=alice"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"access_token":"abc"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let pair = post_token_form(
            &reqwest::Client::new(),
            &token_url(&server),
            &[("grant_type", "password"), ("username", "alice")],
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(pair.access_token, "abc");
    }

    #[tokio::test]
    async fn test_status_classification() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string(r#"{"error":"invalid_grant"}"#),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let cancel = CancellationToken::new();

        let err = post_token_form(&http, &token_url(&server), &[], &cancel)
            .await
            .unwrap_err();
        match err {
            ExchangeError::CredentialsRejected { status, details } => {
                assert_eq!(status, Some(401));
                assert!(details.contains("invalid_grant"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = post_token_form(&http, &token_url(&server), &[], &cancel)
            .await
            .unwrap_err();
        match err {
            ExchangeError::CredentialsRejected { status, details } => {
                assert_eq!(status, Some(503));
                assert_eq!(details, "upstream down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_refused_connection_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url: Url = format!("http://{}/token", listener.local_addr().unwrap())
            .parse()
            .unwrap();
        drop(listener);

        let err = post_token_form(&reqwest::Client::new(), &url, &[], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::NetworkUnavailable(_)));
    }

    #[tokio::test]
    async fn test_cancel_before_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"access_token":"abc"}"#)
                    .set_delay(std::time::Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = post_token_form(&reqwest::Client::new(), &token_url(&server), &[], &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::InteractionCancelled));
    }
}
