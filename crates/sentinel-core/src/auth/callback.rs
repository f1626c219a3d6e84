//! Loopback listener for the authorization code redirect.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::error::ExchangeError;

/// How long a connection may stay silent before it is dropped.
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("failed to bind callback listener on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("callback listener I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("authorization denied: {error}")]
    Denied {
        error: String,
        description: Option<String>,
    },
    #[error("callback state did not match")]
    StateMismatch,
    #[error("callback carried no authorization code")]
    MissingCode,
    #[error("timed out waiting for the browser callback")]
    TimedOut,
    #[error("callback wait cancelled")]
    Cancelled,
}

impl From<CallbackError> for ExchangeError {
    fn from(err: CallbackError) -> Self {
        match err {
            CallbackError::Denied { ref error, .. } if error == "access_denied" => {
                ExchangeError::InteractionCancelled
            }
            CallbackError::TimedOut | CallbackError::Cancelled => {
                ExchangeError::InteractionCancelled
            }
            CallbackError::Denied { .. } | CallbackError::Bind { .. } | CallbackError::Io(_) => {
                ExchangeError::NetworkUnavailable(err.to_string())
            }
            CallbackError::StateMismatch | CallbackError::MissingCode => {
                ExchangeError::MalformedResponse(err.to_string())
            }
        }
    }
}

/// A bound loopback listener waiting for one redirect.
pub struct CallbackListener {
    listener: TcpListener,
    redirect_uri: Url,
}

impl CallbackListener {
    /// Binds to the host and port of `redirect_uri`.
    ///
    /// `localhost` binds to `127.0.0.1`. Port 0 picks a free port, and the
    /// effective URI is reported by [`CallbackListener::redirect_uri`].
    pub async fn bind(redirect_uri: &Url) -> Result<Self, CallbackError> {
        let host = match redirect_uri.host_str() {
            None | Some("localhost") => "127.0.0.1",
            Some(host) => host.trim_start_matches('[').trim_end_matches(']'),
        };
        let port = redirect_uri.port_or_known_default().unwrap_or(0);
        let addr = format!("{host}:{port}");

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| CallbackError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local: SocketAddr = listener.local_addr()?;

        let mut effective = redirect_uri.clone();
        if effective.set_port(Some(local.port())).is_err() {
            return Err(CallbackError::Bind {
                addr,
                source: std::io::Error::other("redirect URI cannot carry a port"),
            });
        }

        Ok(Self {
            listener,
            redirect_uri: effective,
        })
    }

    /// Redirect URI with the port actually bound.
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    /// Waits for the browser to hit the redirect path and returns the code.
    ///
    /// Each connection is served on its own task, so idle preconnect sockets
    /// and broken connections never hold up the redirect. Requests to other
    /// paths (favicon requests and the like) get a 404 and the wait continues.
    pub async fn wait_for_code(
        self,
        expected_state: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<String, CallbackError> {
        let callback_path = self.redirect_uri.path().to_string();
        let (result_tx, mut result_rx) = mpsc::channel(1);

        let accept_loop = async {
            loop {
                tokio::select! {
                    Some(result) = result_rx.recv() => return result,
                    accepted = self.listener.accept() => match accepted {
                        Ok((stream, peer)) => {
                            tracing::debug!(%peer, "Callback connection accepted");
                            tokio::spawn(serve_connection(
                                stream,
                                callback_path.clone(),
                                expected_state.to_string(),
                                result_tx.clone(),
                            ));
                        }
                        Err(e) => tracing::debug!(error = %e, "Failed to accept callback connection"),
                    },
                }
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(CallbackError::Cancelled),
            _ = tokio::time::sleep(timeout) => Err(CallbackError::TimedOut),
            result = accept_loop => result,
        }
    }
}

/// Reads one request and answers it. Only requests for the callback path
/// report a result; everything else is dropped after a response.
async fn serve_connection(
    mut stream: TcpStream,
    callback_path: String,
    expected_state: String,
    result_tx: mpsc::Sender<Result<String, CallbackError>>,
) {
    let request = match tokio::time::timeout(REQUEST_READ_TIMEOUT, read_request_head(&mut stream))
        .await
    {
        Ok(Ok(request)) => request,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "Dropping callback connection");
            return;
        }
        Err(_) => {
            tracing::debug!("Callback connection sent no request");
            return;
        }
    };

    let Some(result) = extract_code_from_request(&request, &callback_path, &expected_state) else {
        let _ = stream.write_all(not_found_response().as_bytes()).await;
        return;
    };

    let page = if result.is_ok() {
        success_response()
    } else {
        error_response()
    };
    let _ = stream.write_all(page.as_bytes()).await;
    let _ = stream.shutdown().await;
    // Fails only when the wait already ended.
    let _ = result_tx.send(result).await;
}

async fn read_request_head(stream: &mut TcpStream) -> Result<String, CallbackError> {
    let mut buffer = vec![0u8; 4096];
    let mut filled = 0;
    loop {
        let read = stream.read(&mut buffer[filled..]).await?;
        filled += read;
        if read == 0 || filled == buffer.len() || buffer[..filled].windows(4).any(|w| w == b"\r\n\r\n")
        {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buffer[..filled]).into_owned())
}

/// Returns `None` when the request is not for the callback path.
fn extract_code_from_request(
    request: &str,
    callback_path: &str,
    expected_state: &str,
) -> Option<Result<String, CallbackError>> {
    let request_line = request.lines().next()?;
    let mut parts = request_line.split_whitespace();
    let _method = parts.next()?;
    let target = parts.next()?;

    let url = Url::parse(&format!("http://localhost{target}")).ok()?;
    if url.path() != callback_path {
        return None;
    }

    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    };

    if let Some(error) = param("error") {
        return Some(Err(CallbackError::Denied {
            error,
            description: param("error_description"),
        }));
    }
    if param("state").as_deref() != Some(expected_state) {
        return Some(Err(CallbackError::StateMismatch));
    }
    Some(param("code").filter(|c| !c.is_empty()).ok_or(CallbackError::MissingCode))
}

fn html_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

fn success_response() -> String {
    html_response(
        "200 OK",
        "<html><body><h3>Login complete</h3><p>You can close this window and return to Database Sentinel.</p></body></html>",
    )
}

fn error_response() -> String {
    html_response(
        "400 Bad Request",
        "<html><body><h3>Login failed</h3><p>Return to Database Sentinel and try again.</p></body></html>",
    )
}

fn not_found_response() -> String {
    html_response("404 Not Found", "")
}
