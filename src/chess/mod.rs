//! Chess domain: the rules oracle adapter and the per-turn value types.

mod action;
mod board;
mod phases;
mod selection;

pub use action::{ChessMove, MoveError};
pub use board::{ChessBoard, FenError, Side};
pub use phases::{Outcome, TurnPhase};
pub use selection::Selection;
