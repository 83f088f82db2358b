//! Tests for the opponent strategies.

use std::collections::HashMap;
use std::time::Duration;

use chess_companion::{
    select_opponent, ChessBoard, EngineError, MoveProvider, OpponentError, RandomOpponent,
    SessionConfig, UciEngine,
};

#[test]
fn test_random_opponent_is_uniform() {
    let board = ChessBoard::new();
    let mut opponent = RandomOpponent::with_seed(42);
    let samples = 20_000;
    let mut counts: HashMap<String, usize> = HashMap::new();

    for _ in 0..samples {
        let mv = opponent.choose(&board).unwrap();
        *counts.entry(mv.uci()).or_default() += 1;
    }

    assert_eq!(counts.len(), 20, "every legal move should be chosen");
    let expected = samples / 20;
    for (uci, count) in &counts {
        assert!(
            count.abs_diff(expected) < expected / 5,
            "{uci} chosen {count} times, expected about {expected}"
        );
    }
}

#[test]
fn test_random_opponent_is_reproducible() {
    let board = ChessBoard::new();
    let mut first = RandomOpponent::with_seed(3);
    let mut second = RandomOpponent::with_seed(3);
    for _ in 0..10 {
        assert_eq!(first.choose(&board).unwrap(), second.choose(&board).unwrap());
    }
}

#[tokio::test]
async fn test_random_opponent_without_moves() {
    let board = ChessBoard::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    let mut opponent = RandomOpponent::with_seed(1);
    let result = opponent.select_move(&board).await;
    assert!(matches!(result, Err(OpponentError::NoLegalMoves)));
}

#[tokio::test]
async fn test_random_flag_skips_engine() {
    let config = SessionConfig::default();
    let opponent = select_opponent(&config, true).await;
    assert_eq!(opponent.name(), "Random mover");
}

/// Engine processes are spawned from one test so no other test forks
/// while a script is still open for writing.
#[tokio::test]
async fn test_engine_lifecycle() {
    let missing = UciEngine::spawn(
        "/nonexistent/chess-engine",
        Duration::from_millis(200),
        Duration::from_millis(500),
    )
    .await;
    assert!(matches!(missing, Err(EngineError::Spawn { .. })));

    let config = SessionConfig::default().with_engine_path("/nonexistent/chess-engine");
    let fallback = select_opponent(&config, false).await;
    assert_eq!(fallback.name(), "Random mover");

    #[cfg(unix)]
    scripted::run_all().await;
}

#[cfg(unix)]
mod scripted {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use chess_companion::{
        ChessBoard, Commentator, CommandInterpreter, EngineError, MoveProvider, OfflineBackend,
        OpponentError, Outcome, SessionContext, Side, Square, TurnMachine, TurnPhase, UciEngine,
    };

    const BUDGET: Duration = Duration::from_millis(200);

    /// Writes a UCI engine whose answer to `go` is the shell snippet `on_go`.
    fn write_engine(dir: &Path, file: &str, on_go: &str) -> PathBuf {
        let script = dir.join(file);
        let body = format!(
            r#"#!/bin/sh
while read -r line; do
  case "$line" in
    uci) echo "id name FakeFish 1.0"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) {on_go} ;;
    quit) exit 0 ;;
  esac
done
"#
        );
        std::fs::write(&script, body).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    async fn spawn(script: &Path) -> UciEngine {
        UciEngine::spawn(script.to_str().unwrap(), BUDGET, Duration::from_secs(5))
            .await
            .expect("scripted engine should complete the handshake")
    }

    fn after_e4() -> ChessBoard {
        let mut board = ChessBoard::new();
        let e4 = board.find_move(Square::E2, Square::E4).unwrap();
        board.apply_move(&e4).unwrap();
        board
    }

    pub async fn run_all() {
        let dir = tempfile::tempdir().unwrap();
        let replying = write_engine(dir.path(), "replying", r#"echo "info depth 1"; echo "bestmove e7e5 ponder g1f3""#);
        let silent = write_engine(dir.path(), "silent", ":");
        let resigned = write_engine(dir.path(), "resigned", r#"echo "bestmove (none)""#);
        let crashing = write_engine(dir.path(), "crashing", "exit 1");
        let confused = write_engine(dir.path(), "confused", r#"echo "bestmove e2e5""#);

        plays_reply(&replying).await;
        search_overrun_times_out(&silent).await;
        none_means_no_legal_moves(&resigned).await;
        closed_output_is_reported(&crashing).await;
        illegal_best_move_is_rejected(&confused).await;
        engine_failure_abandons_game(&crashing).await;
    }

    async fn plays_reply(script: &Path) {
        let mut engine = spawn(script).await;
        assert_eq!(engine.name(), "FakeFish 1.0");

        let reply = engine.select_move(&after_e4()).await.unwrap();
        assert_eq!(reply.uci(), "e7e5");

        engine.shutdown().await;
    }

    async fn search_overrun_times_out(script: &Path) {
        let mut engine = spawn(script).await;
        let result = engine.select_move(&after_e4()).await;
        assert!(
            matches!(result, Err(OpponentError::Engine(EngineError::SearchTimeout(_)))),
            "unexpected result: {result:?}"
        );
        engine.shutdown().await;
    }

    async fn none_means_no_legal_moves(script: &Path) {
        let mut engine = spawn(script).await;
        let result = engine.select_move(&after_e4()).await;
        assert!(matches!(result, Err(OpponentError::NoLegalMoves)));
        engine.shutdown().await;
    }

    async fn closed_output_is_reported(script: &Path) {
        let mut engine = spawn(script).await;
        let result = engine.select_move(&after_e4()).await;
        assert!(
            matches!(result, Err(OpponentError::Engine(EngineError::Closed))),
            "unexpected result: {result:?}"
        );
        engine.shutdown().await;
    }

    async fn illegal_best_move_is_rejected(script: &Path) {
        let mut engine = spawn(script).await;
        let result = engine.select_move(&after_e4()).await;
        assert!(
            matches!(
                &result,
                Err(OpponentError::Engine(EngineError::UnknownMove(uci))) if uci == "e2e5"
            ),
            "unexpected result: {result:?}"
        );
        engine.shutdown().await;
    }

    async fn engine_failure_abandons_game(script: &Path) {
        let engine = spawn(script).await;
        let backend = Arc::new(OfflineBackend);
        let mut machine = TurnMachine::new(
            Box::new(engine),
            Commentator::new(backend.clone(), "English", None),
            CommandInterpreter::new(backend, "English", None),
        );
        let mut ctx = SessionContext::new(Side::White, "control the center");

        machine.click(&mut ctx, Square::E2).await;
        machine.click(&mut ctx, Square::E4).await;

        assert_eq!(ctx.phase(), TurnPhase::GameOver(Outcome::Abandoned));
        assert_eq!(ctx.board().move_count(), 1);
        machine.shutdown().await;
    }
}
