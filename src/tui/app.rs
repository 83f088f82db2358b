//! Application state for the terminal front end.

use crossterm::event::{Event, MouseButton, MouseEventKind};
use tracing::debug;

use super::input::{key_action, BoardGeometry, KeyAction};
use crate::session::{InputEvent, SessionContext};

/// Presentation-side state: the text buffer and the last board geometry.
#[derive(Debug, Default)]
pub struct App {
    input: String,
    geometry: Option<BoardGeometry>,
}

impl App {
    /// Creates an empty application state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of the text box.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Records where the board was last drawn.
    pub fn set_geometry(&mut self, geometry: BoardGeometry) {
        self.geometry = Some(geometry);
    }

    /// Translates a terminal event into a session event.
    ///
    /// Text editing is handled here; only clicks on the board, submissions
    /// and quit requests reach the session.
    pub fn translate(&mut self, event: Event) -> Option<InputEvent> {
        match event {
            Event::Key(key) => match key_action(key) {
                KeyAction::Insert(c) => {
                    self.input.push(c);
                    None
                }
                KeyAction::Backspace => {
                    self.input.pop();
                    None
                }
                KeyAction::Submit => Some(InputEvent::Submit(std::mem::take(&mut self.input))),
                KeyAction::Quit => Some(InputEvent::Quit),
                KeyAction::None => None,
            },
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                let square = self.geometry?.square_at(mouse.column, mouse.row);
                debug!(column = mouse.column, row = mouse.row, ?square, "Pointer down");
                square.map(InputEvent::Click)
            }
            _ => None,
        }
    }

    /// Status to show while `event` is being resolved, if it may block.
    pub fn pending_status(ctx: &SessionContext, event: &InputEvent) -> Option<&'static str> {
        match event {
            InputEvent::Click(square)
                if ctx.is_human_turn() && ctx.selection().is_destination(*square) =>
            {
                Some("Opponent is thinking...")
            }
            InputEvent::Submit(text) if !text.trim().is_empty() => Some("Interpreting your command..."),
            _ => None,
        }
    }
}
