//! Headless login: one attempt, result printed to the console.

use std::io::{BufRead, IsTerminal};
use std::sync::Arc;

use anyhow::{Context, Result};
use sentinel_core::auth::{
    Credentials, LoginOrchestrator, LoginOutcome, LoginStrategy, MainMode, SessionStore,
    SurfaceHost, SystemBrowser, TokenExchanger, TransitionCoordinator, mask_token,
};
use sentinel_core::config::Config;
use sentinel_core::http;
use tokio_util::sync::CancellationToken;

pub struct LoginArgs {
    pub username: Option<String>,
    pub password: Option<String>,
    pub password_stdin: bool,
}

/// Surface host without surfaces: reports hand-off requests as status lines.
struct ConsoleHost;

impl SurfaceHost for ConsoleHost {
    fn present_login(&self) {
        tracing::debug!("Login surface requested");
    }

    fn present_main(&self, mode: MainMode) {
        match mode {
            MainMode::Authenticated => eprintln!("Signed in."),
            MainMode::LoggedOut => eprintln!("Continuing signed out."),
        }
    }

    fn dispose_login(&self) {}
}

pub async fn run(config: &Config, args: LoginArgs) -> Result<()> {
    let http = http::build_client(config)?;
    let exchanger = TokenExchanger::from_config(config, http, Arc::new(SystemBrowser))?;
    let authority = exchanger.authority();
    let strategy = exchanger.strategy();

    // No main surface to fall back to.
    let coordinator = Arc::new(TransitionCoordinator::new(Arc::new(ConsoleHost), false));
    let orchestrator = LoginOrchestrator::new(exchanger, SessionStore::new(), coordinator);
    orchestrator.coordinator().start(orchestrator.session());

    let credentials = match strategy {
        LoginStrategy::Password => read_credentials(args)?,
        LoginStrategy::Interactive => {
            if args.username.is_some() {
                tracing::warn!("Ignoring --username for the interactive login");
            }
            eprintln!("Continue signing in to {authority} in your browser.");
            None
        }
    };

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let outcome = orchestrator.attempt_login(credentials, &cancel).await;
    cancel.cancel();

    match outcome {
        LoginOutcome::Succeeded => {
            println!("Login succeeded.");
            if let Some(token) = orchestrator.session().access_token() {
                println!("Access token: {}", mask_token(&token));
            }
            Ok(())
        }
        LoginOutcome::Failed { message, .. } => anyhow::bail!("{message}"),
        LoginOutcome::Busy => anyhow::bail!("A login is already in progress."),
    }
}

/// Builds the credential pair from flags, the environment or stdin.
///
/// Returns `None` when either half is missing so the orchestrator reports it.
fn read_credentials(args: LoginArgs) -> Result<Option<Credentials>> {
    let password = if args.password_stdin {
        let stdin = std::io::stdin();
        if stdin.is_terminal() {
            eprint!("Password: ");
        }
        let mut line = String::new();
        stdin
            .lock()
            .read_line(&mut line)
            .context("read password from stdin")?;
        Some(line.trim_end_matches(['\r', '\n']).to_string())
    } else {
        args.password
    };

    Ok(args
        .username
        .zip(password)
        .map(|(username, password)| Credentials::new(username.trim(), password)))
}
