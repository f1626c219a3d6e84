//! TUI runtime - owns terminal, runs event loop, executes effects.
//!
//! All side effects happen here. The reducer stays pure and produces
//! effects; this module executes them.
//!
//! Async results arrive through the inbox: the login task and the surface
//! host both send `UiEvent`s to `inbox_tx`, and the loop drains `inbox_rx`
//! every iteration.

mod handlers;
mod host;
mod inbox;

use std::future::Future;
use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use inbox::{UiEventReceiver, UiEventSender};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use sentinel_core::auth::{
    BrowserCapability, LoginOrchestrator, LoginStrategy, SessionStore, StartupAction,
    SystemBrowser, TokenExchanger, TransitionCoordinator,
};
use sentinel_core::config::Config;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub use self::host::ChannelSurfaceHost;
use crate::common::{TaskCompleted, TaskStarted};
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::{render, terminal, update};

/// Tick interval while a login is running (spinner animation).
pub const FRAME_DURATION: Duration = Duration::from_millis(80);

/// Poll duration when idle.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(250);

pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    orchestrator: Arc<LoginOrchestrator>,
    inbox_tx: UiEventSender,
    inbox_rx: UiEventReceiver,
    last_tick: Instant,
}

impl TuiRuntime {
    /// Wires the login stack to a channel-backed surface host and enters the
    /// alternate screen.
    ///
    /// # Errors
    /// Returns an error if the HTTP client, provider settings or terminal
    /// cannot be set up.
    pub fn new(config: &Config, session: SessionStore) -> Result<Self> {
        let capability = BrowserCapability::detect();
        tracing::info!(%capability, strategy = %config.login_strategy, "Starting shell");

        let http = sentinel_core::http::build_client(config)?;
        let exchanger = TokenExchanger::from_config(config, http, Arc::new(SystemBrowser))?;
        let authority = exchanger.authority();
        let strategy = exchanger.strategy();

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let host = Arc::new(ChannelSurfaceHost::new(inbox_tx.clone()));
        let coordinator = Arc::new(TransitionCoordinator::new(
            host,
            config.fallback_to_main_on_cancel,
        ));
        let orchestrator = Arc::new(LoginOrchestrator::new(exchanger, session, coordinator));

        // Set up panic hook BEFORE entering alternate screen
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        Ok(Self {
            terminal,
            state: AppState::new(strategy, authority),
            orchestrator,
            inbox_tx,
            inbox_rx,
            last_tick: Instant::now(),
        })
    }

    /// Runs the main event loop.
    ///
    /// # Errors
    /// Returns an error if terminal I/O fails.
    pub fn run(&mut self) -> Result<()> {
        terminal::enable_input_features()?;

        let startup = self
            .orchestrator
            .coordinator()
            .start(self.orchestrator.session());
        if startup == StartupAction::BeginLogin && self.state.strategy == LoginStrategy::Interactive
        {
            self.execute_effect(UiEffect::StartLogin { credentials: None });
        }

        let result = self.event_loop();

        let _ = terminal::disable_input_features();
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.should_quit {
            let mut events = self.collect_events()?;

            let size = self.terminal.size()?;
            events.insert(
                0,
                UiEvent::Frame {
                    width: size.width,
                    height: size.height,
                },
            );

            for event in events {
                // Frame alone does not change anything visible
                if !matches!(&event, UiEvent::Frame { .. }) {
                    dirty = true;
                }
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }

            if dirty && !self.state.should_quit {
                self.terminal.draw(|frame| {
                    render::render(&self.state, frame);
                })?;
                dirty = false;
            }
        }

        Ok(())
    }

    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let tick_interval = if self.state.is_login_running() {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn dispatch_event(&mut self, event: UiEvent) {
        let effects = update::update(&mut self.state, event);
        if !effects.is_empty() {
            self.execute_effects(effects);
        }
    }

    /// Spawns a cancelable task with a LoginStarted/LoginFinished lifecycle.
    fn spawn_login_task<F, Fut>(&mut self, f: F)
    where
        F: FnOnce(Option<CancellationToken>) -> Fut + Send + 'static,
        Fut: Future<Output = crate::events::LoginReport> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        let id = self.state.task_seq.next_id();
        let cancel = CancellationToken::new();
        // Dispatched inline so the reducer sees the task as running before
        // the next key press.
        self.dispatch_event(UiEvent::LoginStarted(TaskStarted {
            id,
            cancel: Some(cancel.clone()),
        }));
        tokio::spawn(async move {
            let result = f(Some(cancel)).await;
            let _ = tx.send(UiEvent::LoginFinished(TaskCompleted { id, result }));
        });
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }
            UiEffect::StartLogin { credentials } => {
                let orchestrator = Arc::clone(&self.orchestrator);
                self.spawn_login_task(move |cancel| {
                    handlers::login(orchestrator, credentials, cancel)
                });
            }
            UiEffect::CancelTask { token } => {
                if let Some(cancel) = token {
                    cancel.cancel();
                }
            }
            UiEffect::ReenterTerminal => {
                if let Err(e) = terminal::reenter_terminal(&mut self.terminal) {
                    tracing::error!(error = %e, "Failed to restore the shell after a panic");
                    self.state.should_quit = true;
                }
            }
        }
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        let _ = terminal::restore_terminal();
    }
}
