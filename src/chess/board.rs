//! Rules oracle adapter.
//!
//! Legality, move application, and termination are delegated to
//! `shakmaty`. This wrapper adds the move history the oracle does not keep
//! and translates oracle types into the session's vocabulary.

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color, Piece, Position, Role, Square};
use tracing::{debug, instrument};

use super::{ChessMove, MoveError, Outcome};

/// Halfmove clock value at which the 75-move rule ends the game.
const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

/// One of the two players, as seen by the session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Side {
    /// White pieces (moves first).
    White,
    /// Black pieces.
    Black,
}

impl Side {
    /// Returns the other side.
    pub fn opponent(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

/// Error returned when a FEN string cannot be turned into a position.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Invalid FEN {fen:?}: {reason}")]
pub struct FenError {
    /// The rejected FEN text.
    pub fen: String,
    /// Why it was rejected.
    pub reason: String,
}

/// Full chess state for one session.
///
/// Mutated only through [`ChessBoard::apply_move`]; always reflects exactly
/// the sequence of moves applied since construction. The board is queried,
/// never copied:
///
/// ```compile_fail
/// let board = chess_companion::ChessBoard::new();
/// let copy = board.clone();
/// ```
#[derive(Debug)]
pub struct ChessBoard {
    position: Chess,
    initial_fen: Option<String>,
    history: Vec<ChessMove>,
}

impl ChessBoard {
    /// Creates a board in the standard starting position.
    #[instrument]
    pub fn new() -> Self {
        Self {
            position: Chess::default(),
            initial_fen: None,
            history: Vec::new(),
        }
    }

    /// Creates a board from a FEN string.
    #[instrument]
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let parsed: Fen = fen.parse().map_err(|e| FenError {
            fen: fen.to_string(),
            reason: format!("{}", e),
        })?;
        let position: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| FenError {
                fen: fen.to_string(),
                reason: format!("{}", e),
            })?;
        debug!("Board loaded from FEN");
        Ok(Self {
            position,
            initial_fen: Some(fen.to_string()),
            history: Vec::new(),
        })
    }

    /// All legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<ChessMove> {
        self.position
            .legal_moves()
            .into_iter()
            .map(ChessMove::new)
            .collect()
    }

    /// Squares reachable by one legal move from `from`.
    ///
    /// Promotion variants collapse into a single destination.
    #[instrument(skip(self))]
    pub fn legal_destinations(&self, from: Square) -> Vec<Square> {
        let mut destinations: Vec<Square> = self
            .legal_moves()
            .iter()
            .filter(|m| m.from() == Some(from))
            .map(ChessMove::to)
            .collect();
        destinations.sort();
        destinations.dedup();
        destinations
    }

    /// Finds the legal move from `from` to `to`.
    ///
    /// When several promotions share the pair, the queen promotion wins.
    #[instrument(skip(self))]
    pub fn find_move(&self, from: Square, to: Square) -> Option<ChessMove> {
        let mut candidates: Vec<ChessMove> = self
            .legal_moves()
            .into_iter()
            .filter(|m| m.from() == Some(from) && m.to() == to)
            .collect();
        if let Some(idx) = candidates
            .iter()
            .position(|m| m.promotion() == Some(Role::Queen))
        {
            return Some(candidates.swap_remove(idx));
        }
        candidates.into_iter().next()
    }

    /// Finds the legal move whose UCI text is `uci`.
    #[instrument(skip(self))]
    pub fn find_uci(&self, uci: &str) -> Option<ChessMove> {
        self.legal_moves().into_iter().find(|m| m.uci() == uci)
    }

    /// Applies a legal move in place.
    #[instrument(skip(self), fields(mv = %mv))]
    pub fn apply_move(&mut self, mv: &ChessMove) -> Result<(), MoveError> {
        if self.outcome().is_some() {
            return Err(MoveError::GameOver);
        }
        if !self.position.is_legal(mv.as_inner()) {
            return Err(MoveError::Illegal(mv.uci()));
        }
        self.position.play_unchecked(mv.as_inner());
        self.history.push(mv.clone());
        debug!(ply = self.history.len(), "Move applied");
        Ok(())
    }

    /// Piece standing on `square`, if any.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.position.board().piece_at(square)
    }

    /// Side whose turn it is.
    pub fn side_to_move(&self) -> Side {
        self.position.turn().into()
    }

    /// Number of half-moves applied to this board.
    pub fn move_count(&self) -> usize {
        self.history.len()
    }

    /// Moves applied so far, oldest first.
    pub fn history(&self) -> &[ChessMove] {
        &self.history
    }

    /// Applied moves in UCI notation, oldest first.
    pub fn uci_history(&self) -> Vec<String> {
        self.history.iter().map(ChessMove::uci).collect()
    }

    /// UCI `position` command reproducing this board.
    pub fn uci_position(&self) -> String {
        let mut command = match &self.initial_fen {
            Some(fen) => format!("position fen {}", fen),
            None => "position startpos".to_string(),
        };
        if !self.history.is_empty() {
            command.push_str(" moves ");
            command.push_str(&self.uci_history().join(" "));
        }
        command
    }

    /// Game termination as reported by the oracle.
    #[instrument(level = "trace", skip(self))]
    pub fn outcome(&self) -> Option<Outcome> {
        if self.position.is_checkmate() {
            Some(Outcome::Checkmate {
                winner: self.side_to_move().opponent(),
            })
        } else if self.position.is_stalemate() {
            Some(Outcome::Stalemate)
        } else if self.position.is_insufficient_material() {
            Some(Outcome::InsufficientMaterial)
        } else if self.position.halfmoves() >= SEVENTY_FIVE_MOVE_PLIES {
            Some(Outcome::SeventyFiveMoveRule)
        } else {
            None
        }
    }
}

impl Default for ChessBoard {
    fn default() -> Self {
        Self::new()
    }
}
