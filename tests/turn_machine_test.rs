//! Scenario tests for the turn machine with stub collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chess_companion::{
    fallback_commentary, move_index, ChessBoard, ChessMove, Commentator, CommandInterpreter,
    InputEvent, LlmError, MoveProvider, OpponentError, Outcome, RandomOpponent, Role, Selection,
    SessionContext, Side, Square, TextBackend, Transition, TurnMachine, TurnPhase,
    FALLBACK_RESPONSE, FALLBACK_STRATEGY, WELCOME_TEXT,
};

/// Text backend that returns a canned reply and records its calls.
struct CannedBackend {
    reply: Option<String>,
    calls: Arc<AtomicUsize>,
    last_message: Arc<Mutex<Option<String>>>,
}

impl CannedBackend {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
            last_message: Arc::new(Mutex::new(None)),
        }
    }

    fn failing() -> Self {
        Self {
            reply: None,
            calls: Arc::new(AtomicUsize::new(0)),
            last_message: Arc::new(Mutex::new(None)),
        }
    }
}

#[async_trait]
impl TextBackend for CannedBackend {
    async fn generate(&self, _system_prompt: &str, user_message: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_message.lock().unwrap() = Some(user_message.to_string());
        self.reply
            .clone()
            .ok_or_else(|| LlmError::new("backend unavailable".to_string()))
    }

    fn name(&self) -> &str {
        "canned"
    }
}

/// Opponent that wraps a seeded random mover, or always fails.
struct CountingOpponent {
    inner: RandomOpponent,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl MoveProvider for CountingOpponent {
    async fn select_move(&mut self, board: &ChessBoard) -> Result<ChessMove, OpponentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(OpponentError::NoLegalMoves);
        }
        self.inner.select_move(board).await
    }

    fn name(&self) -> &str {
        "counting"
    }
}

struct Harness {
    machine: TurnMachine,
    opponent_calls: Arc<AtomicUsize>,
    commentary_calls: Arc<AtomicUsize>,
    commentary_message: Arc<Mutex<Option<String>>>,
    interpreter_calls: Arc<AtomicUsize>,
}

fn harness(commentary: CannedBackend, interpreter: CannedBackend, opponent_fails: bool) -> Harness {
    let opponent_calls = Arc::new(AtomicUsize::new(0));
    let commentary_calls = commentary.calls.clone();
    let commentary_message = commentary.last_message.clone();
    let interpreter_calls = interpreter.calls.clone();

    let opponent = CountingOpponent {
        inner: RandomOpponent::with_seed(7),
        fail: opponent_fails,
        calls: opponent_calls.clone(),
    };
    let machine = TurnMachine::new(
        Box::new(opponent),
        Commentator::new(Arc::new(commentary), "English", None),
        CommandInterpreter::new(Arc::new(interpreter), "English", None),
    );

    Harness {
        machine,
        opponent_calls,
        commentary_calls,
        commentary_message,
        interpreter_calls,
    }
}

fn default_harness() -> Harness {
    harness(
        CannedBackend::replying("Developing toward the center."),
        CannedBackend::replying(r#"{"strategy": "aggressive", "response": "ok"}"#),
        false,
    )
}

#[tokio::test]
async fn test_human_move_then_opponent_reply() {
    let mut h = default_harness();
    let mut ctx = SessionContext::new(Side::White, "control the center");
    assert_eq!(ctx.annotation(), WELCOME_TEXT);

    let selected = h.machine.click(&mut ctx, Square::E2).await;
    assert_eq!(
        selected,
        Transition::Selected {
            square: Square::E2,
            destinations: 2
        }
    );
    assert_eq!(ctx.phase(), TurnPhase::AwaitingDestination);

    let moved = h.machine.click(&mut ctx, Square::E4).await;
    let Transition::Moved { human, reply } = moved else {
        panic!("expected a move, got {:?}", moved);
    };
    assert_eq!(human.uci(), "e2e4");
    assert!(reply.is_some());

    assert_eq!(ctx.board().history()[0].uci(), "e2e4");
    assert_eq!(ctx.board().move_count(), 2);
    assert_eq!(ctx.board().side_to_move(), Side::White);
    assert_eq!(ctx.phase(), TurnPhase::AwaitingSelection);
    assert!(ctx.selection().is_empty());
    assert_eq!(ctx.annotation(), "Developing toward the center.");
    assert_eq!(h.opponent_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.commentary_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_square_click_has_no_effect() {
    let mut h = default_harness();
    let mut ctx = SessionContext::new(Side::White, "control the center");

    let result = h.machine.click(&mut ctx, Square::E4).await;
    assert_eq!(result, Transition::Ignored);
    assert_eq!(ctx.phase(), TurnPhase::AwaitingSelection);
    assert_eq!(ctx.selection(), &Selection::new());
    assert_eq!(ctx.board().move_count(), 0);
    assert_eq!(ctx.annotation(), WELCOME_TEXT);
    assert_eq!(h.opponent_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.commentary_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.interpreter_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_opponent_piece_cannot_be_selected() {
    let mut h = default_harness();
    let mut ctx = SessionContext::new(Side::White, "control the center");

    assert_eq!(h.machine.click(&mut ctx, Square::E7).await, Transition::Ignored);
    assert!(ctx.selection().is_empty());
    assert_eq!(ctx.phase(), TurnPhase::AwaitingSelection);
}

#[tokio::test]
async fn test_non_destination_click_deselects() {
    let mut h = default_harness();
    let mut ctx = SessionContext::new(Side::White, "control the center");

    h.machine.click(&mut ctx, Square::E2).await;
    let result = h.machine.click(&mut ctx, Square::E5).await;

    assert_eq!(result, Transition::Deselected);
    assert!(ctx.selection().is_empty());
    assert_eq!(ctx.phase(), TurnPhase::AwaitingSelection);
    assert_eq!(ctx.board().move_count(), 0);
    assert_eq!(h.opponent_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_clicking_another_own_piece_only_deselects() {
    let mut h = default_harness();
    let mut ctx = SessionContext::new(Side::White, "control the center");

    h.machine.click(&mut ctx, Square::E2).await;
    assert_eq!(h.machine.click(&mut ctx, Square::D2).await, Transition::Deselected);
    assert!(ctx.selection().square().is_none());

    // A fresh click is needed to select the second piece.
    let result = h.machine.click(&mut ctx, Square::D2).await;
    assert_eq!(
        result,
        Transition::Selected {
            square: Square::D2,
            destinations: 2
        }
    );
}

#[tokio::test]
async fn test_strategy_command_updates_strategy_only() {
    let mut h = default_harness();
    let mut ctx = SessionContext::new(Side::White, "control the center");
    h.machine.click(&mut ctx, Square::G1).await;

    let result = h
        .machine
        .dispatch(&mut ctx, InputEvent::Submit("play aggressively".to_string()))
        .await;

    assert_eq!(
        result,
        Transition::StrategyChanged {
            strategy: "aggressive".to_string()
        }
    );
    assert_eq!(ctx.strategy(), "aggressive");
    assert_eq!(ctx.annotation(), "ok");
    assert_eq!(ctx.board().move_count(), 0);
    assert_eq!(ctx.selection().square(), Some(Square::G1));
    assert_eq!(ctx.phase(), TurnPhase::AwaitingDestination);
    assert_eq!(h.interpreter_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.opponent_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unparseable_interpretation_falls_back() {
    let mut h = harness(
        CannedBackend::replying("fine"),
        CannedBackend::replying("{'strategy': 'aggressive', 'response': 'ok'}"),
        false,
    );
    let mut ctx = SessionContext::new(Side::White, "control the center");

    h.machine.submit(&mut ctx, "attack the king").await;
    assert_eq!(ctx.strategy(), FALLBACK_STRATEGY);
    assert_eq!(ctx.annotation(), FALLBACK_RESPONSE);
}

#[tokio::test]
async fn test_failing_interpreter_falls_back() {
    let mut h = harness(CannedBackend::replying("fine"), CannedBackend::failing(), false);
    let mut ctx = SessionContext::new(Side::White, "control the center");

    h.machine.submit(&mut ctx, "attack the king").await;
    assert_eq!(ctx.strategy(), FALLBACK_STRATEGY);
    assert_eq!(ctx.annotation(), FALLBACK_RESPONSE);
}

#[tokio::test]
async fn test_blank_submission_ignored() {
    let mut h = default_harness();
    let mut ctx = SessionContext::new(Side::White, "control the center");

    assert_eq!(h.machine.submit(&mut ctx, "   ").await, Transition::Ignored);
    assert_eq!(ctx.strategy(), "control the center");
    assert_eq!(h.interpreter_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_commentary_failure_names_the_move() {
    let mut h = harness(
        CannedBackend::failing(),
        CannedBackend::replying("{}"),
        false,
    );
    let mut ctx = SessionContext::new(Side::White, "control the center");

    h.machine.click(&mut ctx, Square::D2).await;
    let Transition::Moved { reply: Some(reply), .. } = h.machine.click(&mut ctx, Square::D4).await
    else {
        panic!("expected an opponent reply");
    };

    assert_eq!(ctx.annotation(), fallback_commentary(&reply.uci()));
    assert!(ctx.annotation().contains(&reply.uci()));
    assert_eq!(ctx.phase(), TurnPhase::AwaitingSelection);
}

#[tokio::test]
async fn test_commentary_receives_move_index() {
    let mut h = default_harness();
    let mut ctx = SessionContext::new(Side::White, "control the center");

    h.machine.click(&mut ctx, Square::E2).await;
    h.machine.click(&mut ctx, Square::E4).await;
    let message = h.commentary_message.lock().unwrap().clone().unwrap();
    // Counted after the reply: two plies played.
    assert!(message.contains("move 2,"), "unexpected prompt: {message}");

    assert_eq!(move_index(0), 1);
    assert_eq!(move_index(1), 1);
    assert_eq!(move_index(2), 2);
    assert_eq!(move_index(3), 2);
}

#[tokio::test]
async fn test_opponent_failure_abandons_game() {
    let mut h = harness(
        CannedBackend::replying("fine"),
        CannedBackend::replying("{}"),
        true,
    );
    let mut ctx = SessionContext::new(Side::White, "control the center");

    h.machine.click(&mut ctx, Square::E2).await;
    let result = h.machine.click(&mut ctx, Square::E4).await;

    assert!(matches!(result, Transition::Moved { reply: None, .. }));
    assert_eq!(ctx.phase(), TurnPhase::GameOver(Outcome::Abandoned));
    assert_eq!(ctx.board().move_count(), 1);
    assert_eq!(h.commentary_calls.load(Ordering::SeqCst), 0);

    // Nothing is accepted after the game ends.
    assert_eq!(h.machine.click(&mut ctx, Square::D2).await, Transition::Ignored);
}

#[tokio::test]
async fn test_human_checkmate_ends_game_without_reply() {
    let mut h = default_harness();
    let board = ChessBoard::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
    let mut ctx = SessionContext::with_board(board, Side::White, "control the center");

    h.machine.click(&mut ctx, Square::A1).await;
    let result = h.machine.click(&mut ctx, Square::A8).await;

    assert!(matches!(result, Transition::Moved { reply: None, .. }));
    assert_eq!(
        ctx.phase(),
        TurnPhase::GameOver(Outcome::Checkmate {
            winner: Side::White
        })
    );
    assert_eq!(h.opponent_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.machine.click(&mut ctx, Square::G1).await, Transition::Ignored);
}

#[tokio::test]
async fn test_finished_position_starts_game_over() {
    let board = ChessBoard::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    let ctx = SessionContext::with_board(board, Side::Black, "control the center");
    assert_eq!(ctx.phase(), TurnPhase::GameOver(Outcome::Stalemate));
    assert!(!ctx.is_human_turn());
}

#[tokio::test]
async fn test_castling_by_king_destination() {
    let mut h = default_harness();
    let board = ChessBoard::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let mut ctx = SessionContext::with_board(board, Side::White, "control the center");

    h.machine.click(&mut ctx, Square::E1).await;
    assert!(ctx.selection().is_destination(Square::G1));
    let result = h.machine.click(&mut ctx, Square::G1).await;

    let Transition::Moved { human, .. } = result else {
        panic!("expected castling to be played");
    };
    assert_eq!(human.uci(), "e1g1");
    assert_eq!(ctx.board().piece_at(Square::G1).map(|p| p.role), Some(Role::King));
    assert_eq!(ctx.board().piece_at(Square::F1).map(|p| p.role), Some(Role::Rook));
}

#[tokio::test]
async fn test_promotion_defaults_to_queen() {
    let mut h = default_harness();
    let board = ChessBoard::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
    let mut ctx = SessionContext::with_board(board, Side::White, "control the center");

    h.machine.click(&mut ctx, Square::A7).await;
    h.machine.click(&mut ctx, Square::A8).await;

    assert_eq!(ctx.board().history()[0].uci(), "a7a8q");
    assert_eq!(h.opponent_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_opponent_opens_when_human_plays_black() {
    let mut h = default_harness();
    let mut ctx = SessionContext::new(Side::Black, "control the center");

    // White to move, so clicks wait for the opponent.
    assert!(!ctx.is_human_turn());
    assert_eq!(h.machine.click(&mut ctx, Square::E7).await, Transition::Ignored);

    let opened = h.machine.start(&mut ctx).await;
    assert!(matches!(opened, Transition::OpponentMoved(_)));
    let message = h.commentary_message.lock().unwrap().clone().unwrap();
    assert!(message.contains("move 1,"), "unexpected prompt: {message}");
    assert_eq!(ctx.board().move_count(), 1);
    assert_eq!(ctx.board().side_to_move(), Side::Black);
    assert!(ctx.is_human_turn());

    // Starting again while the human is to move does nothing.
    assert_eq!(h.machine.start(&mut ctx).await, Transition::Ignored);
    assert_eq!(h.opponent_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_turns_alternate_over_a_game() {
    let mut h = default_harness();
    let mut ctx = SessionContext::new(Side::White, "control the center");
    let mut human_picker = RandomOpponent::with_seed(11);

    for _ in 0..40 {
        if ctx.phase().is_over() {
            break;
        }
        assert_eq!(ctx.board().side_to_move(), Side::White);
        let plies = ctx.board().move_count();
        let calls = h.opponent_calls.load(Ordering::SeqCst);

        let mv = human_picker.choose(ctx.board()).unwrap();
        let from = mv.from().unwrap();
        assert!(matches!(
            h.machine.click(&mut ctx, from).await,
            Transition::Selected { .. }
        ));
        let result = h.machine.click(&mut ctx, mv.to()).await;

        let Transition::Moved { reply, .. } = result else {
            panic!("expected a move, got {:?}", result);
        };
        match reply {
            Some(_) => {
                assert_eq!(ctx.board().move_count(), plies + 2);
                assert_eq!(h.opponent_calls.load(Ordering::SeqCst), calls + 1);
            }
            None => {
                assert_eq!(ctx.board().move_count(), plies + 1);
                assert!(ctx.phase().is_over());
            }
        }
    }

    // Human moves sit on even plies and were all White's.
    let mut check = ChessBoard::new();
    for (ply, mv) in ctx.board().history().iter().enumerate() {
        let expected = if ply % 2 == 0 { Side::White } else { Side::Black };
        assert_eq!(check.side_to_move(), expected);
        check.apply_move(mv).unwrap();
    }
}

#[tokio::test]
async fn test_quit_event() {
    let mut h = default_harness();
    let mut ctx = SessionContext::new(Side::White, "control the center");
    assert_eq!(h.machine.dispatch(&mut ctx, InputEvent::Quit).await, Transition::Quit);
    assert_eq!(h.machine.opponent_name(), "counting");
}
