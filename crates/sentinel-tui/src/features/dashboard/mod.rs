//! Main dashboard surface (placeholder monitoring view).

mod render;
mod state;

pub use render::render_dashboard;
pub use state::{APP_TITLE, DashboardState, PAGE_TITLE, Series};
