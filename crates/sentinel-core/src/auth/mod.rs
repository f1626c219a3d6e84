//! Keycloak login and session hand-off.

mod attempt;
mod callback;
mod discovery;
mod error;
mod exchanger;
mod interactive;
mod orchestrator;
mod password;
pub mod pkce;
mod provider;
mod session;
mod token;
mod transition;

pub use attempt::{
    AttemptStatus, Credentials, LoginAttempt, LoginStrategy, MISSING_CREDENTIALS_MESSAGE,
};
pub use callback::{CallbackError, CallbackListener};
pub use discovery::DiscoveryDocument;
pub use error::{ErrorKind, ExchangeError};
pub use exchanger::TokenExchanger;
pub use interactive::{
    BrowserCapability, BrowserLauncher, DEFAULT_REDIRECT_URI, InteractivePkce, SystemBrowser,
};
pub use orchestrator::{LoginOrchestrator, LoginOutcome};
pub use password::PasswordGrant;
pub use provider::ProviderConfig;
pub use session::{Session, SessionStore, mask_token};
pub use token::TokenPair;
pub use transition::{MainMode, StartupAction, SurfaceHost, TransitionCoordinator, TransitionState};
