//! Chess Companion - terminal client
//!
//! Detects the engine and the text backend once, then hands the session to
//! the terminal UI.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use chess_companion::{
    connect_backend, run_tui, select_opponent, Commentator, CommandInterpreter, SessionConfig,
    SessionContext, TurnMachine,
};
use clap::Parser;
use cli::Cli;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = SessionConfig::load_or_default(&cli.config)?;
    if let Some(engine) = &cli.engine {
        config = config.with_engine_path(engine.clone());
    }
    if let Some(side) = cli.human {
        config = config.with_human_side(side);
    }

    initialize_tracing(config.log_file())?;
    info!(?config, "Starting Chess Companion");

    run_session(config, cli.offline, cli.random).await
}

/// Builds the session's collaborators and runs the UI.
#[instrument(skip(config))]
async fn run_session(config: SessionConfig, offline: bool, random: bool) -> Result<()> {
    let backend = connect_backend(&config, offline);
    let backend_name = backend.name().to_string();

    let commentator = Commentator::new(
        backend.clone(),
        config.commentary_language().clone(),
        config.request_timeout(),
    );
    let interpreter = CommandInterpreter::new(
        backend,
        config.commentary_language().clone(),
        config.request_timeout(),
    );
    let opponent = select_opponent(&config, random).await;

    let machine = TurnMachine::new(opponent, commentator, interpreter);
    let ctx = SessionContext::new(*config.human_side(), config.default_strategy());

    run_tui(machine, ctx, &backend_name).await
}

/// Logs to a file so output never interferes with the TUI.
fn initialize_tracing(log_file: &str) -> Result<()> {
    let file = std::fs::File::create(log_file)
        .with_context(|| format!("Failed to create log file {}", log_file))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,chess_companion=debug")),
        )
        .with_writer(std::sync::Arc::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}
