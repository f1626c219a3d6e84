//! `dev-token serve` handler.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use sentinel_core::config::Config;
use sentinel_core::dev_token::{self, DEV_TOKEN_ROUTE, DevTokenState};
use sentinel_core::http;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub async fn serve(config: &Config, bind: SocketAddr) -> Result<()> {
    if !config.environment.is_development() {
        tracing::warn!(
            environment = ?config.environment,
            "Not in development; every request will be answered with 404"
        );
    }

    let http = http::build_client(config)?;
    let state = DevTokenState::from_config(config, http)?;
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("bind dev token endpoint to {bind}"))?;
    let addr = listener.local_addr().context("read bound address")?;
    eprintln!("Serving POST http://{addr}{DEV_TOKEN_ROUTE} (Ctrl+C to stop)");

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    dev_token::serve(listener, state, shutdown).await?;
    eprintln!("Dev token endpoint stopped.");
    Ok(())
}
