//! Terminal UI for a play session.

mod app;
mod input;
mod ui;

pub use input::{key_action, BoardGeometry, KeyAction};

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tracing::{error, info, instrument};

use crate::orchestrator::{Transition, TurnMachine};
use crate::session::SessionContext;
use app::App;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Raw mode and the alternate screen, restored when dropped.
struct TerminalGuard;

impl TerminalGuard {
    /// Switches the terminal into raw mode, then the alternate screen.
    ///
    /// The guard exists as soon as raw mode is on, so a failure further
    /// along still restores the terminal.
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let guard = Self;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        let _ = disable_raw_mode();
    }
}

/// Runs the interactive session until the user quits.
///
/// The opponent is shut down on every exit path, including errors while
/// setting up the terminal or in the render loop.
pub async fn run_tui(mut machine: TurnMachine, mut ctx: SessionContext, backend_name: &str) -> Result<()> {
    info!("Starting chess TUI");

    let res = run_in_terminal(&mut machine, &mut ctx, backend_name).await;

    machine.shutdown().await;

    if let Err(err) = &res {
        error!(error = ?err, "Session loop error");
        eprintln!("Error: {:?}", err);
    }

    info!("Session ended");
    res
}

async fn run_in_terminal(
    machine: &mut TurnMachine,
    ctx: &mut SessionContext,
    backend_name: &str,
) -> Result<()> {
    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let res = run_session(&mut terminal, machine, ctx, backend_name).await;
    terminal.show_cursor()?;
    res
}

/// Event loop: one input event at a time, resolved to completion.
#[instrument(skip_all, fields(opponent = %machine.opponent_name(), backend = %backend_name))]
async fn run_session(
    terminal: &mut Tui,
    machine: &mut TurnMachine,
    ctx: &mut SessionContext,
    backend_name: &str,
) -> Result<()> {
    let mut app = App::new();
    let footer = format!("Opponent: {} | Commentary: {}", machine.opponent_name(), backend_name);

    if ctx.board().side_to_move() != ctx.human_side() {
        render(terminal, &mut app, ctx, Some("Opponent is thinking..."), &footer)?;
        machine.start(ctx).await;
    }

    loop {
        render(terminal, &mut app, ctx, None, &footer)?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Some(input) = app.translate(event::read()?) else {
            continue;
        };

        if let Some(pending) = App::pending_status(ctx, &input) {
            render(terminal, &mut app, ctx, Some(pending), &footer)?;
        }

        if machine.dispatch(ctx, input).await == Transition::Quit {
            return Ok(());
        }
    }
}

fn render(
    terminal: &mut Tui,
    app: &mut App,
    ctx: &SessionContext,
    pending: Option<&str>,
    footer: &str,
) -> Result<()> {
    let view = ctx.view();
    let status = match pending {
        Some(text) => text.to_string(),
        None => format!("{} | {}", ui::phase_status(&view), footer),
    };
    let input = app.input().to_string();
    let mut geometry = None;
    terminal.draw(|frame| {
        geometry = Some(ui::draw(frame, &view, &input, &status));
    })?;
    if let Some(geometry) = geometry {
        app.set_geometry(geometry);
    }
    Ok(())
}
