//! Application state composition.
//!
//! ```text
//! AppState
//! ├── login: Option<LoginState>       (login surface, while presented)
//! ├── dashboard: Option<DashboardState> (main surface, once presented)
//! ├── task_seq / login_task           (login attempt lifecycle)
//! └── should_quit, spinner_frame, viewport
//! ```
//!
//! Surfaces are created and disposed only through `SurfaceEvent`s coming
//! from the transition coordinator.

use sentinel_core::auth::LoginStrategy;

use crate::common::{TaskSeq, TaskState};
use crate::features::dashboard::DashboardState;
use crate::features::login::LoginState;

#[derive(Debug)]
pub struct AppState {
    pub strategy: LoginStrategy,
    /// Authority shown on the login surface.
    pub authority: String,
    pub login: Option<LoginState>,
    pub dashboard: Option<DashboardState>,
    pub task_seq: TaskSeq,
    pub login_task: TaskState,
    /// Last login error, kept for the dashboard when the login surface is
    /// gone (degraded mode).
    pub last_error: Option<String>,
    /// Masked token provided by the runtime after a successful login.
    pub token_hint: Option<String>,
    pub spinner_frame: usize,
    pub viewport: (u16, u16),
    pub should_quit: bool,
}

impl AppState {
    pub fn new(strategy: LoginStrategy, authority: impl Into<String>) -> Self {
        Self {
            strategy,
            authority: authority.into(),
            login: None,
            dashboard: None,
            task_seq: TaskSeq::default(),
            login_task: TaskState::default(),
            last_error: None,
            token_hint: None,
            spinner_frame: 0,
            viewport: (0, 0),
            should_quit: false,
        }
    }

    pub fn is_login_running(&self) -> bool {
        self.login_task.is_running()
    }

    /// True once any surface has been shown and none remains.
    pub fn has_no_surface(&self) -> bool {
        self.login.is_none() && self.dashboard.is_none()
    }
}
