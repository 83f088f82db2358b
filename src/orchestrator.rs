//! Turn resolution between the human and the opponent.
//!
//! [`TurnMachine::dispatch`] is the single transition function: it takes
//! one [`InputEvent`] and the session's [`SessionContext`] and performs
//! every consequence of that event before returning, including the
//! opponent's reply and its commentary. Service failures never reach this
//! level as errors; the narration services are total and an opponent
//! failure ends the game.

use shakmaty::Square;
use tracing::{debug, error, info, instrument};

use crate::chess::{ChessMove, Outcome, Side, TurnPhase};
use crate::narration::{Commentator, CommandInterpreter};
use crate::opponent::MoveProvider;
use crate::session::{InputEvent, SessionContext};

/// What an event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed.
    Ignored,
    /// A piece was selected.
    Selected {
        /// Selected square.
        square: Square,
        /// Number of legal destinations from it.
        destinations: usize,
    },
    /// The selection was dropped by a click on a non-destination.
    Deselected,
    /// The human moved, followed by the opponent's reply when the game allowed one.
    Moved {
        /// The human's move.
        human: ChessMove,
        /// The opponent's reply.
        reply: Option<ChessMove>,
    },
    /// The opponent moved without a preceding human move (session start).
    OpponentMoved(ChessMove),
    /// A text command replaced the strategy.
    StrategyChanged {
        /// New strategy label.
        strategy: String,
    },
    /// The user asked to quit.
    Quit,
}

/// Move number quoted in commentary once `plies_played` half-moves are on
/// the board.
pub fn move_index(plies_played: usize) -> u32 {
    (plies_played / 2 + 1) as u32
}

/// Orchestrates one game between the human and an opponent.
pub struct TurnMachine {
    opponent: Box<dyn MoveProvider>,
    commentator: Commentator,
    interpreter: CommandInterpreter,
}

impl TurnMachine {
    /// Creates a turn machine from its collaborators.
    pub fn new(
        opponent: Box<dyn MoveProvider>,
        commentator: Commentator,
        interpreter: CommandInterpreter,
    ) -> Self {
        info!(opponent = %opponent.name(), "Creating turn machine");
        Self {
            opponent,
            commentator,
            interpreter,
        }
    }

    /// Name of the opponent in use for this session.
    pub fn opponent_name(&self) -> &str {
        self.opponent.name()
    }

    /// Lets the opponent open when the human plays Black.
    #[instrument(skip_all)]
    pub async fn start(&mut self, ctx: &mut SessionContext) -> Transition {
        if ctx.phase().is_over() || ctx.board().side_to_move() == ctx.human_side() {
            return Transition::Ignored;
        }
        info!("Opponent moves first");
        ctx.set_phase(TurnPhase::OpponentTurn);
        match self.resolve_opponent_turn(ctx).await {
            Some(mv) => Transition::OpponentMoved(mv),
            None => Transition::Ignored,
        }
    }

    /// Applies one input event to `ctx`.
    #[instrument(skip(self, ctx), fields(phase = ?ctx.phase()))]
    pub async fn dispatch(&mut self, ctx: &mut SessionContext, event: InputEvent) -> Transition {
        match event {
            InputEvent::Click(square) => self.click(ctx, square).await,
            InputEvent::Submit(text) => self.submit(ctx, &text).await,
            InputEvent::Quit => {
                info!("Quit requested");
                Transition::Quit
            }
        }
    }

    /// Handles a click on `square`.
    #[instrument(skip(self, ctx), fields(square = %square))]
    pub async fn click(&mut self, ctx: &mut SessionContext, square: Square) -> Transition {
        if !ctx.is_human_turn() {
            debug!("Click ignored, not the human's turn");
            return Transition::Ignored;
        }

        match ctx.phase() {
            TurnPhase::AwaitingSelection => select(ctx, square),
            TurnPhase::AwaitingDestination => {
                let Some(from) = ctx.selection().square() else {
                    ctx.set_phase(TurnPhase::AwaitingSelection);
                    return Transition::Ignored;
                };
                if !ctx.selection().is_destination(square) {
                    // Select-once: the click only drops the selection.
                    debug!("Not a legal destination, deselecting");
                    ctx.selection_mut().clear();
                    ctx.set_phase(TurnPhase::AwaitingSelection);
                    return Transition::Deselected;
                }
                self.play_human_move(ctx, from, square).await
            }
            TurnPhase::OpponentTurn | TurnPhase::GameOver(_) => Transition::Ignored,
        }
    }

    /// Handles a text submission.
    #[instrument(skip(self, ctx))]
    pub async fn submit(&mut self, ctx: &mut SessionContext, text: &str) -> Transition {
        let command = text.trim();
        if command.is_empty() {
            return Transition::Ignored;
        }

        let directive = self.interpreter.interpret(command).await;
        info!(strategy = %directive.strategy(), "Strategy updated");
        ctx.set_strategy(directive.strategy().clone());
        ctx.set_annotation(directive.response().clone());
        Transition::StrategyChanged {
            strategy: directive.strategy().clone(),
        }
    }

    /// Releases the opponent's resources.
    #[instrument(skip(self))]
    pub async fn shutdown(&mut self) {
        self.opponent.shutdown().await;
    }

    async fn play_human_move(
        &mut self,
        ctx: &mut SessionContext,
        from: Square,
        to: Square,
    ) -> Transition {
        let Some(mv) = ctx.board().find_move(from, to) else {
            ctx.selection_mut().clear();
            ctx.set_phase(TurnPhase::AwaitingSelection);
            return Transition::Deselected;
        };

        if let Err(e) = ctx.board_mut().apply_move(&mv) {
            error!(error = %e, "Oracle rejected a listed move");
            ctx.selection_mut().clear();
            ctx.set_phase(TurnPhase::AwaitingSelection);
            return Transition::Deselected;
        }
        info!(mv = %mv, "Human move applied");
        ctx.selection_mut().clear();

        if let Some(outcome) = ctx.board().outcome() {
            info!(%outcome, "Game over after human move");
            ctx.set_phase(TurnPhase::GameOver(outcome));
            return Transition::Moved {
                human: mv,
                reply: None,
            };
        }

        ctx.set_phase(TurnPhase::OpponentTurn);
        let reply = self.resolve_opponent_turn(ctx).await;
        Transition::Moved { human: mv, reply }
    }

    /// Plays the opponent's move and sets its commentary.
    #[instrument(skip_all, fields(opponent = %self.opponent.name()))]
    async fn resolve_opponent_turn(&mut self, ctx: &mut SessionContext) -> Option<ChessMove> {
        let mv = match self.opponent.select_move(ctx.board()).await {
            Ok(mv) => mv,
            Err(e) => {
                error!(error = %e, "Opponent could not move");
                ctx.set_phase(TurnPhase::GameOver(Outcome::Abandoned));
                return None;
            }
        };

        if let Err(e) = ctx.board_mut().apply_move(&mv) {
            error!(error = %e, mv = %mv, "Opponent move rejected");
            ctx.set_phase(TurnPhase::GameOver(Outcome::Abandoned));
            return None;
        }
        info!(mv = %mv, "Opponent move applied");

        let annotation = self
            .commentator
            .explain(&mv, move_index(ctx.board().move_count()), ctx.strategy())
            .await;
        ctx.set_annotation(annotation);

        match ctx.board().outcome() {
            Some(outcome) => {
                info!(%outcome, "Game over after opponent move");
                ctx.set_phase(TurnPhase::GameOver(outcome));
            }
            None => ctx.set_phase(TurnPhase::AwaitingSelection),
        }
        Some(mv)
    }
}

/// Selects `square` if it holds a piece of the side to move.
fn select(ctx: &mut SessionContext, square: Square) -> Transition {
    let side = ctx.board().side_to_move();
    match ctx.board().piece_at(square) {
        Some(piece) if Side::from(piece.color) == side => {
            let destinations = ctx.board().legal_destinations(square);
            let count = destinations.len();
            ctx.selection_mut().select(square, destinations);
            ctx.set_phase(TurnPhase::AwaitingDestination);
            Transition::Selected {
                square,
                destinations: count,
            }
        }
        _ => Transition::Ignored,
    }
}

impl std::fmt::Debug for TurnMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnMachine")
            .field("opponent", &self.opponent.name())
            .field("commentator", &self.commentator)
            .field("interpreter", &self.interpreter)
            .finish()
    }
}
