//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use sentinel_core::auth::{Credentials, LoginOutcome, LoginStrategy, MainMode};

use crate::effects::UiEffect;
use crate::events::{LoginReport, SurfaceEvent, UiEvent};
use crate::features::dashboard::DashboardState;
use crate::features::login::{self, LoginAction, LoginState};
use crate::state::AppState;

pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
            vec![]
        }
        UiEvent::Frame { width, height } => {
            app.viewport = (width, height);
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::Surface(surface) => handle_surface_event(app, surface),
        UiEvent::LoginStarted(started) => {
            app.login_task.on_started(&started);
            if let Some(login) = app.login.as_mut() {
                login.busy = true;
                login.error = None;
            }
            vec![]
        }
        UiEvent::LoginFinished(completed) => {
            if !app.login_task.finish_if_active(completed.id) {
                return vec![];
            }
            handle_login_report(app, &completed.result);
            if completed.result.aborted {
                vec![UiEffect::ReenterTerminal]
            } else {
                vec![]
            }
        }
    }
}

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
        Event::Paste(text) => {
            if let Some(login) = app.login.as_mut() {
                login::handle_paste(login, &text);
            }
            vec![]
        }
        _ => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return quit(app);
    }

    // The login surface has focus until the dashboard replaces it.
    if app.dashboard.is_none()
        && let Some(login) = app.login.as_mut()
    {
        return match login::handle_key(login, key) {
            LoginAction::None => vec![],
            LoginAction::Submit(credentials) => start_login(app, credentials),
            LoginAction::Cancel => cancel_login(app),
            LoginAction::Quit => quit(app),
        };
    }

    let Some(mode) = app.dashboard.as_ref().map(|d| d.mode) else {
        return vec![];
    };
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => quit(app),
        KeyCode::Char('l')
            if mode == MainMode::LoggedOut && app.strategy == LoginStrategy::Interactive =>
        {
            start_login(app, None)
        }
        _ => vec![],
    }
}

fn start_login(app: &mut AppState, credentials: Option<Credentials>) -> Vec<UiEffect> {
    if app.is_login_running() {
        return vec![];
    }
    if let Some(login) = app.login.as_mut() {
        login.busy = true;
        login.error = None;
    }
    app.last_error = None;
    vec![UiEffect::StartLogin { credentials }]
}

fn cancel_login(app: &mut AppState) -> Vec<UiEffect> {
    if !app.is_login_running() {
        return vec![];
    }
    vec![UiEffect::CancelTask {
        token: app.login_task.cancel.clone(),
    }]
}

fn quit(app: &mut AppState) -> Vec<UiEffect> {
    let mut effects = cancel_login(app);
    effects.push(UiEffect::Quit);
    effects
}

fn handle_surface_event(app: &mut AppState, event: SurfaceEvent) -> Vec<UiEffect> {
    match event {
        SurfaceEvent::PresentLogin => {
            if app.login.is_none() {
                let mut login = LoginState::new(app.strategy);
                login.busy = app.is_login_running();
                app.login = Some(login);
            }
            vec![]
        }
        SurfaceEvent::PresentMain(mode) => {
            let dashboard = app
                .dashboard
                .get_or_insert_with(|| DashboardState::new(mode));
            dashboard.mode = mode;
            if mode == MainMode::Authenticated {
                dashboard.token_hint.clone_from(&app.token_hint);
            }
            vec![]
        }
        SurfaceEvent::DisposeLogin => {
            app.login = None;
            if app.has_no_surface() {
                return quit(app);
            }
            vec![]
        }
    }
}

fn handle_login_report(app: &mut AppState, report: &LoginReport) {
    if let Some(login) = app.login.as_mut() {
        login::handle_outcome(login, &report.outcome);
    }
    match &report.outcome {
        LoginOutcome::Succeeded => {
            app.last_error = None;
            app.token_hint.clone_from(&report.token_hint);
            if let Some(dashboard) = app.dashboard.as_mut() {
                dashboard.token_hint.clone_from(&report.token_hint);
            }
        }
        LoginOutcome::Failed { message, .. } => {
            app.last_error = Some(message.clone());
        }
        LoginOutcome::Busy => {}
    }
}
