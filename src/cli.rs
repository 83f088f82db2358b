//! Command-line interface for chess_companion.

use chess_companion::Side;
use clap::Parser;

/// Chess Companion - play an engine that explains its moves
#[derive(Parser, Debug)]
#[command(name = "chess_companion")]
#[command(about = "Play chess against an engine with natural-language commentary", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the session configuration file
    #[arg(short, long, default_value = "chess_companion.toml")]
    pub config: std::path::PathBuf,

    /// Path to a UCI engine executable (overrides config and STOCKFISH_PATH)
    #[arg(short, long)]
    pub engine: Option<String>,

    /// Colour the human plays (white or black)
    #[arg(long)]
    pub human: Option<Side>,

    /// Skip the LLM and use the offline commentary stub
    #[arg(long)]
    pub offline: bool,

    /// Skip engine detection and play random moves
    #[arg(long)]
    pub random: bool,
}
