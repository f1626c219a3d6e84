//! Hand-off from the login surface to the main dashboard.
//!
//! The coordinator owns the `AwaitingLogin -> Active` state machine. The
//! transition fires at most once per process: the main surface is presented
//! first, then the login surface is disposed, so the process never has zero
//! surfaces while the hand-off is in progress.

use std::sync::{Arc, Mutex, PoisonError};

use super::attempt::LoginStrategy;
use super::error::ErrorKind;
use super::session::SessionStore;

/// What the main surface shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainMode {
    Authenticated,
    /// Degraded fallback after an interactive login was abandoned.
    LoggedOut,
}

/// Callback seam to whatever hosts the visible surfaces.
pub trait SurfaceHost: Send + Sync {
    fn present_login(&self);
    /// Shows the main surface, or switches its mode if already shown.
    fn present_main(&self, mode: MainMode);
    fn dispose_login(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    AwaitingLogin,
    Active,
}

/// Returned by [`TransitionCoordinator::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupAction {
    /// The login surface is up; the caller should begin a login.
    BeginLogin,
    /// A valid session already existed and the main surface is up.
    AlreadyActive,
}

#[derive(Debug)]
struct Inner {
    state: TransitionState,
    transitions: u32,
    main_presented: bool,
    login_disposed: bool,
}

pub struct TransitionCoordinator {
    host: Arc<dyn SurfaceHost>,
    fallback_to_main_on_cancel: bool,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for TransitionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionCoordinator")
            .field("fallback_to_main_on_cancel", &self.fallback_to_main_on_cancel)
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl TransitionCoordinator {
    pub fn new(host: Arc<dyn SurfaceHost>, fallback_to_main_on_cancel: bool) -> Self {
        Self {
            host,
            fallback_to_main_on_cancel,
            inner: Mutex::new(Inner {
                state: TransitionState::AwaitingLogin,
                transitions: 0,
                main_presented: false,
                login_disposed: false,
            }),
        }
    }

    pub fn state(&self) -> TransitionState {
        self.lock().state
    }

    /// Number of times the `AwaitingLogin -> Active` transition fired.
    pub fn transition_count(&self) -> u32 {
        self.lock().transitions
    }

    /// Decides the first surface.
    pub fn start(&self, session: &SessionStore) -> StartupAction {
        if session.is_authenticated() {
            tracing::info!("Existing session found, skipping login");
            self.on_login_succeeded();
            return StartupAction::AlreadyActive;
        }
        self.host.present_login();
        StartupAction::BeginLogin
    }

    /// Fires the transition. Later calls are no-ops.
    pub fn on_login_succeeded(&self) {
        let mut inner = self.lock();
        if inner.state == TransitionState::Active {
            tracing::debug!("Transition already fired, ignoring");
            return;
        }
        inner.state = TransitionState::Active;
        inner.transitions += 1;
        inner.main_presented = true;
        let dispose = !inner.login_disposed;
        inner.login_disposed = true;
        drop(inner);

        tracing::info!("Login succeeded, presenting main surface");
        self.host.present_main(MainMode::Authenticated);
        if dispose {
            self.host.dispose_login();
        }
    }

    /// Applies the degraded-mode fallback for abandoned interactive logins.
    ///
    /// Returns true if the main surface was presented as logged out.
    pub fn on_login_failed(&self, strategy: LoginStrategy, kind: ErrorKind) -> bool {
        if !self.fallback_to_main_on_cancel || strategy != LoginStrategy::Interactive {
            return false;
        }
        let mut inner = self.lock();
        if inner.state == TransitionState::Active || inner.main_presented {
            return false;
        }
        inner.main_presented = true;
        inner.login_disposed = true;
        drop(inner);

        tracing::warn!(?kind, "Interactive login abandoned, continuing logged out");
        self.host.present_main(MainMode::LoggedOut);
        self.host.dispose_login();
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
