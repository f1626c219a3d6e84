//! Default command: the full-screen dashboard shell.

use anyhow::Result;
use sentinel_core::auth::SessionStore;
use sentinel_core::config::Config;

pub async fn run(config: &Config) -> Result<()> {
    sentinel_tui::run_shell(config, SessionStore::new()).await
}
