//! Login orchestration.
//!
//! Runs one login attempt at a time: validates input, drives the exchanger,
//! records the user-facing error and notifies the transition coordinator.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;

use super::attempt::{
    AttemptStatus, Credentials, LoginAttempt, LoginStrategy, MISSING_CREDENTIALS_MESSAGE,
};
use super::error::{ErrorKind, ExchangeError};
use super::exchanger::TokenExchanger;
use super::session::SessionStore;
use super::transition::TransitionCoordinator;

/// Result of [`LoginOrchestrator::attempt_login`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Succeeded,
    /// `kind` is `None` when the input was rejected before any exchange.
    Failed {
        kind: Option<ErrorKind>,
        message: String,
    },
    /// Another attempt was already in flight; nothing was done.
    Busy,
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Succeeded)
    }
}

/// Clears the busy flag on every exit path, unwinding included.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct LoginOrchestrator {
    exchanger: TokenExchanger,
    session: SessionStore,
    coordinator: Arc<TransitionCoordinator>,
    busy: AtomicBool,
    last_error: Mutex<Option<String>>,
    authority: String,
}

impl LoginOrchestrator {
    pub fn new(
        exchanger: TokenExchanger,
        session: SessionStore,
        coordinator: Arc<TransitionCoordinator>,
    ) -> Self {
        let authority = exchanger.authority();
        Self {
            exchanger,
            session,
            coordinator,
            busy: AtomicBool::new(false),
            last_error: Mutex::new(None),
            authority,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn strategy(&self) -> LoginStrategy {
        self.exchanger.strategy()
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn coordinator(&self) -> &Arc<TransitionCoordinator> {
        &self.coordinator
    }

    /// Message from the most recent failed attempt, if it has not been
    /// superseded by a success.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs one login attempt with the configured strategy.
    ///
    /// Credentials are required for the password strategy and ignored for
    /// the interactive one. Returns [`LoginOutcome::Busy`] without side
    /// effects if an attempt is already running.
    pub async fn attempt_login(
        &self,
        credentials: Option<Credentials>,
        cancel: &CancellationToken,
    ) -> LoginOutcome {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Login already in progress");
            return LoginOutcome::Busy;
        }
        let _guard = BusyGuard(&self.busy);

        let mut attempt = LoginAttempt::new(self.exchanger.strategy(), credentials);
        if !attempt.has_required_credentials() {
            self.set_error(Some(MISSING_CREDENTIALS_MESSAGE.to_string()));
            return LoginOutcome::Failed {
                kind: None,
                message: MISSING_CREDENTIALS_MESSAGE.to_string(),
            };
        }

        tracing::info!(strategy = %attempt.strategy(), "Starting login");
        let result = AssertUnwindSafe(self.exchanger.exchange(&attempt, &self.session, cancel))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                self.session.clear();
                Err(ExchangeError::NetworkUnavailable(
                    "token exchange panicked".into(),
                ))
            });

        match result {
            Ok(()) => {
                attempt.finish(AttemptStatus::Succeeded);
                self.set_error(None);
                tracing::info!("Login succeeded");
                self.coordinator.on_login_succeeded();
                LoginOutcome::Succeeded
            }
            Err(err) => {
                let kind = err.kind();
                attempt.finish(kind.attempt_status());
                let message = kind.user_message(&self.authority);
                tracing::warn!(error = %err, status = ?attempt.status(), "Login failed");
                self.set_error(Some(message.clone()));
                self.coordinator.on_login_failed(attempt.strategy(), kind);
                LoginOutcome::Failed {
                    kind: Some(kind),
                    message,
                }
            }
        }
    }

    fn set_error(&self, message: Option<String>) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = message;
    }
}
