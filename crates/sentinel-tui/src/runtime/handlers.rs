//! Effect handlers. Pure async functions returning the result payload; the
//! runtime owns spawning and delivery.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use sentinel_core::auth::{Credentials, LoginOrchestrator, LoginOutcome, mask_token};
use tokio_util::sync::CancellationToken;

use crate::events::LoginReport;

/// Runs one login attempt through the orchestrator.
///
/// Always yields a report, even if the hand-off panics, so the login surface
/// is never left waiting on a task that is gone.
pub async fn login(
    orchestrator: Arc<LoginOrchestrator>,
    credentials: Option<Credentials>,
    cancel: Option<CancellationToken>,
) -> LoginReport {
    report_or_aborted(attempt(orchestrator, credentials, cancel)).await
}

async fn attempt(
    orchestrator: Arc<LoginOrchestrator>,
    credentials: Option<Credentials>,
    cancel: Option<CancellationToken>,
) -> LoginReport {
    let cancel = cancel.unwrap_or_default();
    let outcome = orchestrator.attempt_login(credentials, &cancel).await;
    let token_hint = match outcome {
        LoginOutcome::Succeeded => orchestrator
            .session()
            .access_token()
            .map(|token| mask_token(&token)),
        _ => None,
    };
    LoginReport::new(outcome, token_hint)
}

async fn report_or_aborted<F>(task: F) -> LoginReport
where
    F: Future<Output = LoginReport>,
{
    match AssertUnwindSafe(task).catch_unwind().await {
        Ok(report) => report,
        Err(_) => {
            tracing::error!("Login task panicked");
            LoginReport::aborted()
        }
    }
}
