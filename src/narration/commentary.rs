//! One-sentence commentary on the opponent's moves.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, instrument};

use super::TextBackend;
use crate::chess::ChessMove;

/// Deterministic text shown when commentary cannot be produced.
pub fn fallback_commentary(uci: &str) -> String {
    format!("(AI played {}, no explanation available)", uci)
}

/// Explains moves in the voice of the engine's declared strategy.
#[derive(Clone)]
pub struct Commentator {
    backend: Arc<dyn TextBackend>,
    language: String,
    timeout: Option<Duration>,
}

impl Commentator {
    /// Creates a commentator on top of `backend`.
    ///
    /// `timeout` bounds each backend call; `None` waits indefinitely.
    pub fn new(backend: Arc<dyn TextBackend>, language: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            backend,
            language: language.into(),
            timeout,
        }
    }

    /// Returns one short sentence about `mv`.
    ///
    /// Never fails: any backend error, timeout, or blank reply yields
    /// [`fallback_commentary`] naming the move.
    #[instrument(skip(self, mv), fields(mv = %mv, backend = self.backend.name()))]
    pub async fn explain(&self, mv: &ChessMove, move_index: u32, strategy: &str) -> String {
        let uci = mv.uci();
        let system_prompt = format!(
            "You are a chess AI that comments on its own moves in {}. \
             Your declared strategy is \"{}\".",
            self.language, strategy
        );
        let user_message = format!(
            "This is move {}, the move played was {}. \
             In one sentence of at most 20 words, explain the strategic intent of this move.",
            move_index, uci
        );

        let call = self.backend.generate(&system_prompt, &user_message);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    error!(timeout = ?limit, "Commentary request timed out");
                    return fallback_commentary(&uci);
                }
            },
            None => call.await,
        };

        match result {
            Ok(text) if !text.trim().is_empty() => {
                debug!("Commentary generated");
                text.trim().to_string()
            }
            Ok(_) => {
                error!("Commentary backend returned blank text");
                fallback_commentary(&uci)
            }
            Err(e) => {
                error!(error = %e, "Failed to generate commentary");
                fallback_commentary(&uci)
            }
        }
    }
}

impl std::fmt::Debug for Commentator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Commentator")
            .field("backend", &self.backend.name())
            .field("language", &self.language)
            .field("timeout", &self.timeout)
            .finish()
    }
}
