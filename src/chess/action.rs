//! First-class move values.
//!
//! A [`ChessMove`] is one legal move as reported by the rules oracle. It is
//! immutable once constructed and carries whatever promotion or castling
//! metadata the oracle attached to it.

use shakmaty::{CastlingMode, File, Move, Role, Square};
use tracing::instrument;

/// A single move: origin, destination, and oracle metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChessMove {
    inner: Move,
}

impl ChessMove {
    /// Wraps a move produced by the rules oracle.
    pub(crate) fn new(inner: Move) -> Self {
        Self { inner }
    }

    /// Returns the underlying oracle move.
    pub fn as_inner(&self) -> &Move {
        &self.inner
    }

    /// Origin square.
    ///
    /// Standard chess never produces drops, so every move has an origin;
    /// the `Option` only mirrors the oracle's variant-aware signature.
    pub fn from(&self) -> Option<Square> {
        self.inner.from()
    }

    /// Destination square as the human sees it.
    ///
    /// For castling the oracle encodes "king takes own rook"; this returns
    /// the king's landing square instead (g- or c-file).
    pub fn to(&self) -> Square {
        match self.inner {
            Move::Castle { king, rook } => {
                let file = if rook > king { File::G } else { File::C };
                Square::from_coords(file, king.rank())
            }
            ref other => other.to(),
        }
    }

    /// Promotion role, if this is a promoting pawn move.
    pub fn promotion(&self) -> Option<Role> {
        self.inner.promotion()
    }

    /// Compact UCI notation, e.g. `e2e4`, `e7e8q`, `e1g1`.
    #[instrument(level = "trace", skip(self))]
    pub fn uci(&self) -> String {
        self.inner.to_uci(CastlingMode::Standard).to_string()
    }
}

impl std::fmt::Display for ChessMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uci())
    }
}

/// Error that can occur when applying a move.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// The move is not in the current legal-move list.
    #[display("Illegal move: {}", _0)]
    Illegal(String),

    /// The game is already over.
    #[display("Game is already over")]
    GameOver,
}

impl std::error::Error for MoveError {}
