//! Session state shared between the turn machine and the presentation layer.
//!
//! Everything mutable about a game lives in one [`SessionContext`] value,
//! passed by reference into [`crate::TurnMachine`]'s transition function.

use shakmaty::Square;
use tracing::{debug, instrument};

use crate::chess::{ChessBoard, Selection, Side, TurnPhase};

/// Annotation shown before anything has happened.
pub const WELCOME_TEXT: &str = "Welcome! Click a piece, or type a strategy below and press Enter.";

/// Raw input forwarded by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Pointer went down over a board square.
    Click(Square),
    /// The text box was submitted with this buffer.
    Submit(String),
    /// The user asked to leave.
    Quit,
}

/// Mutable state of one game.
///
/// ```compile_fail
/// use chess_companion::{SessionContext, Side};
/// let ctx = SessionContext::new(Side::White, "control the center");
/// let copy = ctx.clone();
/// ```
#[derive(Debug)]
pub struct SessionContext {
    board: ChessBoard,
    selection: Selection,
    phase: TurnPhase,
    strategy: String,
    annotation: String,
    human_side: Side,
}

impl SessionContext {
    /// Creates a context for a fresh game.
    #[instrument(skip(strategy), fields(strategy = %strategy.as_ref()))]
    pub fn new(human_side: Side, strategy: impl AsRef<str>) -> Self {
        Self::with_board(ChessBoard::new(), human_side, strategy)
    }

    /// Creates a context around an existing position.
    #[instrument(skip(board, strategy))]
    pub fn with_board(board: ChessBoard, human_side: Side, strategy: impl AsRef<str>) -> Self {
        let phase = match board.outcome() {
            Some(outcome) => TurnPhase::GameOver(outcome),
            None => TurnPhase::AwaitingSelection,
        };
        debug!(?phase, "Session context created");
        Self {
            board,
            selection: Selection::new(),
            phase,
            strategy: strategy.as_ref().to_string(),
            annotation: WELCOME_TEXT.to_string(),
            human_side,
        }
    }

    /// The board.
    pub fn board(&self) -> &ChessBoard {
        &self.board
    }

    /// The human's current selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Current phase of the turn.
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Active strategy label.
    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    /// Latest commentary or confirmation text.
    pub fn annotation(&self) -> &str {
        &self.annotation
    }

    /// Colour the human plays.
    pub fn human_side(&self) -> Side {
        self.human_side
    }

    /// Returns true when it is the human's move and the game is running.
    pub fn is_human_turn(&self) -> bool {
        !self.phase.is_over() && self.board.side_to_move() == self.human_side
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> BoardView<'_> {
        BoardView {
            board: &self.board,
            selection: &self.selection,
            annotation: &self.annotation,
            strategy: &self.strategy,
            phase: self.phase,
            human_side: self.human_side,
        }
    }

    pub(crate) fn board_mut(&mut self) -> &mut ChessBoard {
        &mut self.board
    }

    pub(crate) fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub(crate) fn set_phase(&mut self, phase: TurnPhase) {
        debug!(from = ?self.phase, to = ?phase, "Phase change");
        self.phase = phase;
    }

    pub(crate) fn set_strategy(&mut self, strategy: String) {
        self.strategy = strategy;
    }

    pub(crate) fn set_annotation(&mut self, annotation: String) {
        self.annotation = annotation;
    }
}

/// Everything the presentation layer draws in one frame.
#[derive(Debug, Clone, Copy)]
pub struct BoardView<'a> {
    /// Board to draw.
    pub board: &'a ChessBoard,
    /// Highlighted square and destination markers.
    pub selection: &'a Selection,
    /// Latest commentary.
    pub annotation: &'a str,
    /// Active strategy label.
    pub strategy: &'a str,
    /// Turn phase, used for the status line.
    pub phase: TurnPhase,
    /// Orientation of the board.
    pub human_side: Side,
}
