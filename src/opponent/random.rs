//! Uniform random mover used when no engine is available.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use tracing::{debug, instrument};

use super::{MoveProvider, OpponentError};
use crate::chess::{ChessBoard, ChessMove};

/// Picks uniformly among all legal moves.
#[derive(Debug)]
pub struct RandomOpponent {
    name: String,
    rng: StdRng,
}

impl RandomOpponent {
    /// Creates a random mover seeded from the OS.
    pub fn new() -> Self {
        Self {
            name: "Random mover".to_string(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Creates a reproducible random mover.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            name: "Random mover".to_string(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Picks one of the legal moves on `board`.
    #[instrument(skip(self, board))]
    pub fn choose(&mut self, board: &ChessBoard) -> Result<ChessMove, OpponentError> {
        let moves = board.legal_moves();
        let chosen = moves
            .choose(&mut self.rng)
            .cloned()
            .ok_or(OpponentError::NoLegalMoves)?;
        debug!(choices = moves.len(), mv = %chosen, "Random move chosen");
        Ok(chosen)
    }
}

impl Default for RandomOpponent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MoveProvider for RandomOpponent {
    async fn select_move(&mut self, board: &ChessBoard) -> Result<ChessMove, OpponentError> {
        self.choose(board)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
