use sentinel_core::auth::MainMode;

pub const APP_TITLE: &str = "Database Sentinel";
pub const PAGE_TITLE: &str = "Dashboard";

/// One activity series on the dashboard chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: &'static str,
    pub values: Vec<f64>,
}

impl Series {
    /// `(index, value)` points for charting.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v))
            .collect()
    }
}

/// Main surface state. Monitoring data is placeholder only.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub mode: MainMode,
    /// Masked access token shown in the header when signed in.
    pub token_hint: Option<String>,
    pub server_count: u32,
    pub alert_count: u32,
    pub series: Vec<Series>,
}

impl DashboardState {
    pub fn new(mode: MainMode) -> Self {
        Self {
            mode,
            token_hint: None,
            server_count: 0,
            alert_count: 0,
            series: vec![
                Series {
                    name: "CPU %",
                    values: vec![12.0, 15.0, 18.0, 14.0, 20.0, 22.0, 19.0],
                },
                Series {
                    name: "Waits",
                    values: vec![8.0, 11.0, 9.0, 14.0, 12.0, 10.0, 13.0],
                },
                Series {
                    name: "Memory (GB)",
                    values: vec![6.0, 10.0, 12.0, 14.0, 20.0, 36.0, 48.0],
                },
            ],
        }
    }

    pub fn server_summary(&self) -> String {
        match self.server_count {
            0 => "No servers configured. Add a server to begin monitoring.".to_string(),
            1 => "Monitoring 1 server.".to_string(),
            n => format!("Monitoring {n} servers."),
        }
    }

    pub fn alert_summary(&self) -> String {
        match self.alert_count {
            0 => "No active alerts.".to_string(),
            1 => "1 active alert.".to_string(),
            n => format!("{n} active alerts."),
        }
    }

    pub fn session_label(&self) -> String {
        match (self.mode, &self.token_hint) {
            (MainMode::Authenticated, Some(hint)) => format!("Signed in ({hint})"),
            (MainMode::Authenticated, None) => "Signed in".to_string(),
            (MainMode::LoggedOut, _) => "Signed out".to_string(),
        }
    }

    /// Upper y bound across all series, rounded up to a multiple of 10.
    pub fn y_max(&self) -> f64 {
        let max = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0_f64, f64::max);
        ((max / 10.0).ceil() * 10.0).max(10.0)
    }
}
