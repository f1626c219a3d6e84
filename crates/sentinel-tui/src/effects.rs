//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! The reducer decides; the runtime performs the I/O.

use sentinel_core::auth::Credentials;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Run one login attempt in the background.
    ///
    /// `credentials` is `None` for the interactive strategy.
    StartLogin { credentials: Option<Credentials> },

    /// Cancel an in-flight task by its token.
    CancelTask { token: Option<CancellationToken> },

    /// Enter raw mode and the alternate screen again after a panic hook
    /// restored the terminal.
    ReenterTerminal,
}
