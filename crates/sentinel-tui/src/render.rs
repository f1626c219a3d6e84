//! Top-level view.
//!
//! The dashboard takes the whole screen once presented; until then the login
//! surface is drawn.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::features::dashboard::render_dashboard;
use crate::features::login::render_login;
use crate::state::AppState;

pub fn render(app: &AppState, frame: &mut Frame) {
    if let Some(dashboard) = &app.dashboard {
        render_dashboard(frame, dashboard);
        render_status(app, frame);
    } else if let Some(login) = &app.login {
        render_login(frame, login, &app.authority, app.spinner_frame);
    }
}

/// Bottom-right status for the degraded dashboard: an in-flight login or
/// the last failure.
fn render_status(app: &AppState, frame: &mut Frame) {
    let text = if app.is_login_running() {
        Span::styled("Signing in...", Style::default().fg(Color::Yellow))
    } else if let Some(error) = &app.last_error {
        Span::styled(error.clone(), Style::default().fg(Color::Red))
    } else {
        return;
    };

    let [_, bottom] = Layout::vertical([Constraint::Min(0), Constraint::Length(1)])
        .areas(frame.area());
    frame.render_widget(Paragraph::new(Line::from(text)).right_aligned(), bottom);
}
