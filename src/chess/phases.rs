//! Turn phases and game outcomes.

use serde::{Deserialize, Serialize};

use super::Side;

/// Where the turn-resolution machine currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Waiting for the human to pick one of their pieces.
    AwaitingSelection,
    /// A piece is selected; waiting for a destination click.
    AwaitingDestination,
    /// The human has moved; the opponent reply is being resolved.
    OpponentTurn,
    /// No further human moves are accepted.
    GameOver(Outcome),
}

impl TurnPhase {
    /// Returns true once the game has ended.
    pub fn is_over(&self) -> bool {
        matches!(self, TurnPhase::GameOver(_))
    }
}

/// Outcome of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The side to move is mated.
    Checkmate {
        /// Side that delivered mate.
        winner: Side,
    },
    /// The side to move has no legal move and is not in check.
    Stalemate,
    /// Neither side can mate.
    InsufficientMaterial,
    /// 75 moves by each side without a capture or pawn move.
    SeventyFiveMoveRule,
    /// The opponent could not produce a move.
    Abandoned,
}

impl Outcome {
    /// Returns the winner if there is one.
    pub fn winner(&self) -> Option<Side> {
        match self {
            Outcome::Checkmate { winner } => Some(*winner),
            _ => None,
        }
    }

    /// Returns true for every drawn result.
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Outcome::Stalemate | Outcome::InsufficientMaterial | Outcome::SeventyFiveMoveRule
        )
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Checkmate { winner } => write!(f, "Checkmate, {} wins", winner),
            Outcome::Stalemate => write!(f, "Draw by stalemate"),
            Outcome::InsufficientMaterial => write!(f, "Draw by insufficient material"),
            Outcome::SeventyFiveMoveRule => write!(f, "Draw by the 75-move rule"),
            Outcome::Abandoned => write!(f, "Game abandoned: the opponent could not move"),
        }
    }
}
