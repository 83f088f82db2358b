//! Chess Companion - play an engine with live commentary
//!
//! The human plays one fixed colour by clicking squares; the opponent
//! replies with a UCI engine (or random legal moves when none is
//! available), and an LLM explains each reply in the voice of a strategy
//! the human can change at any time with a free-text command.
//!
//! # Architecture
//!
//! - **Chess**: rules oracle adapter over `shakmaty`
//! - **Opponent**: engine-backed or random move providers
//! - **Narration**: commentary and command interpretation with offline fallbacks
//! - **Orchestrator**: the turn-resolution state machine
//! - **TUI**: terminal presentation layer
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chess_companion::{
//!     Commentator, CommandInterpreter, InputEvent, OfflineBackend, RandomOpponent,
//!     SessionContext, Side, TurnMachine,
//! };
//!
//! # async fn example() {
//! let backend = Arc::new(OfflineBackend);
//! let mut machine = TurnMachine::new(
//!     Box::new(RandomOpponent::new()),
//!     Commentator::new(backend.clone(), "English", None),
//!     CommandInterpreter::new(backend, "English", None),
//! );
//! let mut ctx = SessionContext::new(Side::White, "control the center");
//! machine.dispatch(&mut ctx, InputEvent::Submit("play aggressively".into())).await;
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod chess;
mod config;
mod llm_client;
mod narration;
mod opponent;
mod orchestrator;
mod session;
mod tui;

// Crate-level exports - Chess domain
pub use chess::{ChessBoard, ChessMove, FenError, MoveError, Outcome, Selection, Side, TurnPhase};

// Crate-level exports - Configuration
pub use config::{ConfigError, SessionConfig};

// Crate-level exports - LLM client
pub use llm_client::{LlmClient, LlmConfig, LlmError, LlmProvider};

// Crate-level exports - Narration services
pub use narration::{
    connect_backend, fallback_commentary, Commentator, CommandInterpreter, FailoverBackend,
    OfflineBackend, StrategyDirective, TextBackend, FALLBACK_RESPONSE, FALLBACK_STRATEGY,
};

// Crate-level exports - Opponents
pub use opponent::{select_opponent, EngineError, MoveProvider, OpponentError, RandomOpponent, UciEngine};

// Crate-level exports - Turn resolution
pub use orchestrator::{move_index, Transition, TurnMachine};
pub use session::{BoardView, InputEvent, SessionContext, WELCOME_TEXT};

// Crate-level exports - Terminal front end
pub use tui::{key_action, run_tui, BoardGeometry, KeyAction};

/// Re-exported rules types used in the public API.
pub use shakmaty::{Piece, Role, Square};
