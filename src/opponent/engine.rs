//! UCI engine subprocess.
//!
//! The process is spawned once at startup and owned by the session. It is
//! released on every exit path: [`MoveProvider::shutdown`] sends `quit`
//! and reaps it, and dropping [`UciEngine`] kills whatever is left.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use super::{MoveProvider, OpponentError};
use crate::chess::{ChessBoard, ChessMove};

/// Time the engine gets beyond its budget before a search is abandoned.
const SEARCH_GRACE: Duration = Duration::from_secs(2);

/// How long `quit` is given before the process is killed.
const QUIT_GRACE: Duration = Duration::from_millis(500);

/// Failures talking to the engine process.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum EngineError {
    /// The executable could not be started.
    #[display("Failed to start engine {path}: {reason}")]
    Spawn {
        /// Executable path.
        path: String,
        /// OS error text.
        reason: String,
    },

    /// The `uci`/`isready` handshake did not finish in time.
    #[display("Engine handshake timed out after {:?}", _0)]
    HandshakeTimeout(#[error(not(source))] Duration),

    /// The search did not produce `bestmove` in time.
    #[display("Engine search timed out after {:?}", _0)]
    SearchTimeout(#[error(not(source))] Duration),

    /// Reading from or writing to the process failed.
    #[display("Engine I/O error: {}", _0)]
    Io(std::io::Error),

    /// The process closed its output.
    #[display("Engine closed its output")]
    Closed,

    /// `bestmove` named something that is not a legal move.
    #[display("Engine suggested an unknown move: {}", _0)]
    UnknownMove(#[error(not(source))] String),
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e)
    }
}

/// A running UCI engine.
#[derive(Debug)]
pub struct UciEngine {
    name: String,
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    time_limit: Duration,
}

impl UciEngine {
    /// Spawns the engine at `path` and completes the UCI handshake.
    #[instrument(skip(time_limit, handshake_timeout))]
    pub async fn spawn(
        path: &str,
        time_limit: Duration,
        handshake_timeout: Duration,
    ) -> Result<Self, EngineError> {
        info!("Starting engine process");

        let spawn_error = |reason: String| EngineError::Spawn {
            path: path.to_string(),
            reason,
        };

        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| spawn_error("Failed to capture stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_error("Failed to capture stdout".to_string()))?;

        let mut engine = Self {
            name: path.to_string(),
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            time_limit,
        };

        match timeout(handshake_timeout, engine.handshake()).await {
            Ok(Ok(())) => {
                info!(engine = %engine.name, "Engine ready");
                Ok(engine)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(EngineError::HandshakeTimeout(handshake_timeout)),
        }
    }

    /// `uci` → `uciok`, `isready` → `readyok`.
    async fn handshake(&mut self) -> Result<(), EngineError> {
        self.send("uci").await?;
        loop {
            let line = self.read_line().await?;
            if let Some(name) = line.strip_prefix("id name ") {
                self.name = name.trim().to_string();
            } else if line.trim() == "uciok" {
                break;
            }
        }
        self.send("ucinewgame").await?;
        self.send("isready").await?;
        self.wait_for("readyok").await?;
        Ok(())
    }

    /// Runs one timed search and returns the engine's best move as UCI text.
    #[instrument(skip(self, board), fields(ply = board.move_count()))]
    async fn search(&mut self, board: &ChessBoard) -> Result<String, EngineError> {
        self.send(&board.uci_position()).await?;
        self.send(&format!("go movetime {}", self.time_limit.as_millis())).await?;

        let limit = self.time_limit + SEARCH_GRACE;
        let line = match timeout(limit, self.wait_for_prefix("bestmove")).await {
            Ok(line) => line?,
            Err(_) => {
                warn!("Search overran its budget, stopping engine");
                let _ = self.send("stop").await;
                return Err(EngineError::SearchTimeout(limit));
            }
        };

        let best = line
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| EngineError::UnknownMove(line.clone()))?;
        debug!(best, "Engine answered");
        Ok(best.to_string())
    }

    async fn send(&mut self, command: &str) -> Result<(), EngineError> {
        debug!(command, "-> engine");
        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String, EngineError> {
        match self.stdout.next_line().await? {
            Some(line) => Ok(line),
            None => Err(EngineError::Closed),
        }
    }

    async fn wait_for(&mut self, token: &str) -> Result<(), EngineError> {
        while self.read_line().await?.trim() != token {}
        Ok(())
    }

    async fn wait_for_prefix(&mut self, prefix: &str) -> Result<String, EngineError> {
        loop {
            let line = self.read_line().await?;
            if line.starts_with(prefix) {
                return Ok(line);
            }
        }
    }
}

#[async_trait::async_trait]
impl MoveProvider for UciEngine {
    async fn select_move(&mut self, board: &ChessBoard) -> Result<ChessMove, OpponentError> {
        if board.legal_moves().is_empty() {
            return Err(OpponentError::NoLegalMoves);
        }
        let best = self.search(board).await?;
        if best == "(none)" {
            return Err(OpponentError::NoLegalMoves);
        }
        board
            .find_uci(&best)
            .ok_or_else(|| EngineError::UnknownMove(best).into())
    }

    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(engine = %self.name))]
    async fn shutdown(&mut self) {
        info!("Shutting down engine");
        let _ = self.send("quit").await;
        match timeout(QUIT_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => debug!(?status, "Engine exited"),
            _ => {
                warn!("Engine did not exit after quit, killing it");
                let _ = self.child.start_kill();
            }
        }
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        debug!(engine = %self.name, "Releasing engine process");
        let _ = self.child.start_kill();
    }
}
