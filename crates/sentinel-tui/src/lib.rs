//! Full-screen terminal shell for Database Sentinel.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, Write, stderr};

use anyhow::Result;
pub use runtime::TuiRuntime;
use sentinel_core::auth::SessionStore;
use sentinel_core::config::Config;

/// Runs the shell: login surface first, then the dashboard.
///
/// # Errors
/// Returns an error if stdout is not a terminal or the runtime fails.
pub async fn run_shell(config: &Config, session: SessionStore) -> Result<()> {
    if !std::io::stdout().is_terminal() {
        anyhow::bail!(
            "The dashboard requires a terminal.\n\
             Use `sentinel login` for a non-interactive login."
        );
    }

    let mut runtime = TuiRuntime::new(config, session)?;
    let result = runtime.run();
    drop(runtime);
    result?;

    writeln!(stderr(), "Goodbye!")?;
    Ok(())
}
