//! Dashboard view.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph};

use super::state::{APP_TITLE, DashboardState, PAGE_TITLE};
use sentinel_core::auth::MainMode;

const SERIES_COLORS: [Color; 3] = [Color::Cyan, Color::Yellow, Color::Magenta];

pub fn render_dashboard(frame: &mut Frame, dashboard: &DashboardState) {
    let [header, stats, chart, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(4),
        Constraint::Min(8),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, header, dashboard);
    render_stats(frame, stats, dashboard);
    render_chart(frame, chart, dashboard);
    render_footer(frame, footer, dashboard);
}

fn render_header(frame: &mut Frame, area: Rect, dashboard: &DashboardState) {
    let session_style = match dashboard.mode {
        MainMode::Authenticated => Style::default().fg(Color::Green),
        MainMode::LoggedOut => Style::default().fg(Color::Red),
    };
    let line = Line::from(vec![
        Span::styled(
            APP_TITLE,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {PAGE_TITLE}"), Style::default().fg(Color::Gray)),
        Span::raw("  "),
        Span::styled(dashboard.session_label(), session_style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_stats(frame: &mut Frame, area: Rect, dashboard: &DashboardState) {
    let [servers, alerts] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);

    let card = |title: &str, count: u32, summary: String| {
        Paragraph::new(vec![
            Line::from(Span::styled(
                count.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(summary, Style::default().fg(Color::Gray))),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(" {title} ")),
        )
    };

    frame.render_widget(
        card(
            "Monitored servers",
            dashboard.server_count,
            dashboard.server_summary(),
        ),
        servers,
    );
    frame.render_widget(
        card(
            "Active alerts",
            dashboard.alert_count,
            dashboard.alert_summary(),
        ),
        alerts,
    );
}

fn render_chart(frame: &mut Frame, area: Rect, dashboard: &DashboardState) {
    let points: Vec<Vec<(f64, f64)>> = dashboard.series.iter().map(|s| s.points()).collect();
    let datasets: Vec<Dataset<'_>> = dashboard
        .series
        .iter()
        .zip(points.iter())
        .enumerate()
        .map(|(i, (series, data))| {
            Dataset::default()
                .name(series.name)
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]))
                .data(data)
        })
        .collect();

    let x_max = dashboard
        .series
        .iter()
        .map(|s| s.values.len())
        .max()
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1) as f64;
    let y_max = dashboard.y_max();

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Activity "),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, x_max]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, y_max])
                .labels(["0".to_string(), format!("{:.0}", y_max / 2.0), format!("{y_max:.0}")]),
        );
    frame.render_widget(chart, area);
}

fn render_footer(frame: &mut Frame, area: Rect, dashboard: &DashboardState) {
    let key = Style::default().fg(Color::Cyan);
    let text = Style::default().fg(Color::DarkGray);
    let mut spans = Vec::new();
    if dashboard.mode == MainMode::LoggedOut {
        spans.push(Span::styled("l", key));
        spans.push(Span::styled(" sign in  ", text));
    }
    spans.push(Span::styled("q", key));
    spans.push(Span::styled(" quit", text));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
