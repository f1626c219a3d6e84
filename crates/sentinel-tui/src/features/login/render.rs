//! Login surface view.

use ratatui::Frame;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use super::state::{LoginField, LoginState};
use crate::common::{centered_area, render_panel};

const SPINNER: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub fn render_login(frame: &mut Frame, login: &LoginState, authority: &str, spinner_frame: usize) {
    let area = centered_area(frame.area(), 64, 14);
    let inner = render_panel(frame, area, "Database Sentinel - Sign in", Color::Cyan);

    let mut lines = vec![
        Line::from(Span::styled(
            authority.to_string(),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
    ];

    if login.uses_form() {
        lines.push(field_line(
            "Username",
            &login.username,
            login.focus == LoginField::Username,
        ));
        let masked: String = "•".repeat(login.password.chars().count());
        lines.push(field_line(
            "Password",
            &masked,
            login.focus == LoginField::Password,
        ));
    } else {
        lines.push(Line::from("Sign-in continues in your web browser."));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(""));

    if login.busy {
        let spinner = SPINNER[spinner_frame % SPINNER.len()];
        let label = if login.uses_form() {
            "Signing in..."
        } else {
            "Waiting for the browser..."
        };
        lines.push(Line::from(Span::styled(
            format!("{spinner} {label}"),
            Style::default().fg(Color::Yellow),
        )));
    } else if let Some(error) = &login.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    } else {
        lines.push(Line::from(""));
    }

    lines.push(Line::from(""));
    lines.push(hint_line(login));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let label_style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let mut spans = vec![
        Span::styled(format!("{label:>9}: "), label_style),
        Span::raw(value.to_string()),
    ];
    if focused {
        spans.push(Span::styled("█", Style::default().fg(Color::Cyan)));
    }
    Line::from(spans)
}

fn hint_line(login: &LoginState) -> Line<'static> {
    let key = Style::default().fg(Color::Cyan);
    let text = Style::default().fg(Color::DarkGray);
    if login.busy {
        return Line::from(vec![
            Span::styled("Esc", key),
            Span::styled(" cancel", text),
        ]);
    }
    let submit = if login.uses_form() {
        " sign in  "
    } else {
        " open browser  "
    };
    let mut spans = vec![Span::styled("Enter", key), Span::styled(submit, text)];
    if login.uses_form() {
        spans.push(Span::styled("Tab", key));
        spans.push(Span::styled(" next field  ", text));
    }
    spans.push(Span::styled("Esc", key));
    spans.push(Span::styled(" quit", text));
    Line::from(spans)
}
