//! Opponent move providers.
//!
//! The session holds exactly one provider, chosen at startup by
//! [`select_opponent`]: the UCI engine when its process starts and answers
//! the handshake, otherwise the uniform random mover. The choice is never
//! revisited mid-session.

mod engine;
mod random;

pub use engine::{EngineError, UciEngine};
pub use random::RandomOpponent;

use crate::chess::{ChessBoard, ChessMove};
use crate::config::SessionConfig;
use tracing::{info, instrument, warn};

/// Trait for opponents that can produce a move.
#[async_trait::async_trait]
pub trait MoveProvider: Send {
    /// Chooses a legal move for the side to move on `board`.
    ///
    /// Callers check for game over first; with at least one legal move the
    /// random provider never fails.
    async fn select_move(&mut self, board: &ChessBoard) -> Result<ChessMove, OpponentError>;

    /// Returns the provider's display name.
    fn name(&self) -> &str;

    /// Releases any external resources. Called once when the session ends.
    async fn shutdown(&mut self) {}
}

/// Why an opponent could not move.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum OpponentError {
    /// The position has no legal move.
    #[display("No legal moves available")]
    NoLegalMoves,

    /// The engine process failed during a search.
    #[display("Engine failure: {}", _0)]
    Engine(EngineError),
}

impl From<EngineError> for OpponentError {
    fn from(e: EngineError) -> Self {
        OpponentError::Engine(e)
    }
}

/// Startup capability detection for the opponent.
///
/// Engine trouble is logged once as a warning and the random mover is
/// installed for the whole session.
#[instrument(skip(config), fields(engine_path = %config.engine_path()))]
pub async fn select_opponent(config: &SessionConfig, force_random: bool) -> Box<dyn MoveProvider> {
    if force_random {
        info!("Random opponent requested");
        return Box::new(RandomOpponent::new());
    }

    match UciEngine::spawn(
        config.engine_path(),
        config.engine_time_limit(),
        config.engine_handshake_timeout(),
    )
    .await
    {
        Ok(engine) => {
            info!(engine = %engine.name(), "Engine loaded");
            Box::new(engine)
        }
        Err(e) => {
            warn!(error = %e, "Engine unavailable, the opponent will play random moves");
            Box::new(RandomOpponent::new())
        }
    }
}
