//! UI event types.
//!
//! Everything the reducer reacts to arrives as a `UiEvent`: terminal input,
//! timer ticks, surface requests from the transition coordinator, and login
//! task lifecycle notifications.

use crossterm::event::Event as CrosstermEvent;
use sentinel_core::auth::{LoginOutcome, MainMode};

use crate::common::{TaskCompleted, TaskStarted};

/// Shown when a login task dies without reporting an outcome.
pub const LOGIN_ABORTED_MESSAGE: &str = "Login stopped unexpectedly. See the log for details.";

/// Result of one login task, as seen by the reducer.
#[derive(Debug)]
pub struct LoginReport {
    pub outcome: LoginOutcome,
    /// Masked access token after a success.
    pub token_hint: Option<String>,
    /// The task panicked; the panic hook has already left the alternate screen.
    pub aborted: bool,
}

impl LoginReport {
    pub fn new(outcome: LoginOutcome, token_hint: Option<String>) -> Self {
        Self {
            outcome,
            token_hint,
            aborted: false,
        }
    }

    pub fn aborted() -> Self {
        Self {
            outcome: LoginOutcome::Failed {
                kind: None,
                message: LOGIN_ABORTED_MESSAGE.to_string(),
            },
            token_hint: None,
            aborted: true,
        }
    }
}

/// Surface requests forwarded from the transition coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    PresentLogin,
    PresentMain(MainMode),
    DisposeLogin,
}

#[derive(Debug)]
pub enum UiEvent {
    /// Timer tick (spinner animation).
    Tick,

    /// Emitted once per frame before other events, with terminal dimensions.
    Frame { width: u16, height: u16 },

    /// Terminal input event (key, paste, resize).
    Terminal(CrosstermEvent),

    Surface(SurfaceEvent),

    /// A login attempt task was spawned.
    LoginStarted(TaskStarted),

    /// A login attempt task finished.
    LoginFinished(TaskCompleted<LoginReport>),
}
