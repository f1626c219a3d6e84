//! CLI entry and dispatch.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use sentinel_core::auth::LoginStrategy;
use sentinel_core::config::Config;
use sentinel_core::logging::{self, LogOptions};

mod commands;

#[derive(Parser)]
#[command(name = "sentinel")]
#[command(version)]
#[command(about = "Database Sentinel terminal dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Sign in through the system browser (Authorization Code + PKCE)
    #[arg(long, global = true, conflicts_with = "password")]
    interactive: bool,

    /// Sign in with username and password
    #[arg(long, global = true)]
    password: bool,

    /// Verbose logging
    #[arg(long, global = true)]
    debug: bool,
}

impl Cli {
    fn strategy_override(&self) -> Option<LoginStrategy> {
        if self.interactive {
            Some(LoginStrategy::Interactive)
        } else if self.password {
            Some(LoginStrategy::Password)
        } else {
            None
        }
    }
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in once without the dashboard and print the result
    Login {
        /// Username for the password grant
        #[arg(short, long, env = "SENTINEL_USERNAME")]
        username: Option<String>,

        /// Password for the password grant (prefer SENTINEL_PASSWORD or --password-stdin)
        #[arg(
            long = "secret",
            env = "SENTINEL_PASSWORD",
            hide_env_values = true,
            conflicts_with = "password_stdin"
        )]
        secret: Option<String>,

        /// Read the password from the first line of stdin
        #[arg(long)]
        password_stdin: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Development token-mint endpoint
    DevToken {
        #[command(subcommand)]
        command: DevTokenCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

#[derive(clap::Subcommand)]
enum DevTokenCommands {
    /// Serve POST /dev/token until interrupted
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:5080")]
        bind: SocketAddr,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let strategy = cli.strategy_override();
    // The shell owns the terminal, so only headless commands log to stderr.
    let log_options = LogOptions {
        debug: cli.debug,
        stderr: cli.command.is_some(),
    };

    // default to the dashboard shell
    let Some(command) = cli.command else {
        let _log_guard = logging::init(log_options)?;
        let config = load_config(strategy)?;
        return commands::shell::run(&config).await;
    };

    match command {
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },

        Commands::Login {
            username,
            secret,
            password_stdin,
        } => {
            let _log_guard = logging::init(log_options)?;
            let config = load_config(strategy)?;
            commands::login::run(
                &config,
                commands::login::LoginArgs {
                    username,
                    password: secret,
                    password_stdin,
                },
            )
            .await
        }

        Commands::DevToken { command } => match command {
            DevTokenCommands::Serve { bind } => {
                let _log_guard = logging::init(log_options)?;
                let config = load_config(strategy)?;
                commands::dev_token::serve(&config, bind).await
            }
        },
    }
}

fn load_config(strategy: Option<LoginStrategy>) -> Result<Config> {
    let mut config = Config::load().context("load config")?;
    if let Some(strategy) = strategy {
        config.login_strategy = strategy;
    }
    tracing::debug!(
        environment = ?config.environment,
        strategy = %config.login_strategy,
        "Config loaded"
    );
    Ok(config)
}
