//! Mapping raw terminal input onto session events.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use derive_new::new;
use shakmaty::{File, Rank, Square};

use crate::chess::Side;

/// Where the board was drawn in the last frame.
///
/// `left`/`top` is the terminal cell of the top-left board square; every
/// square is `cell_width` × `cell_height` cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct BoardGeometry {
    left: u16,
    top: u16,
    cell_width: u16,
    cell_height: u16,
    orientation: Side,
}

impl BoardGeometry {
    /// Square under terminal cell (`column`, `row`), if the cell is on the board.
    pub fn square_at(&self, column: u16, row: u16) -> Option<Square> {
        if column < self.left || row < self.top || self.cell_width == 0 || self.cell_height == 0 {
            return None;
        }
        let dx = (column - self.left) / self.cell_width;
        let dy = (row - self.top) / self.cell_height;
        if dx >= 8 || dy >= 8 {
            return None;
        }
        Some(self.square_for_cell(dx, dy))
    }

    /// Square drawn at board cell (`dx`, `dy`), counted from the top-left.
    pub fn square_for_cell(&self, dx: u16, dy: u16) -> Square {
        let (file, rank) = self.coords_for_cell(dx, dy);
        Square::from_coords(File::new(file), Rank::new(rank))
    }

    /// File and rank indices (0-7) drawn at board cell (`dx`, `dy`).
    pub fn coords_for_cell(&self, dx: u16, dy: u16) -> (u32, u32) {
        let (dx, dy) = (u32::from(dx), u32::from(dy));
        match self.orientation {
            Side::White => (dx, 7 - dy),
            Side::Black => (7 - dx, dy),
        }
    }

    /// Terminal column of the left edge of board cell `dx`.
    pub fn column_of(&self, dx: u16) -> u16 {
        self.left + dx * self.cell_width
    }

    /// Terminal row of the top edge of board cell `dy`.
    pub fn row_of(&self, dy: u16) -> u16 {
        self.top + dy * self.cell_height
    }

    /// Width of one square in terminal cells.
    pub fn cell_width(&self) -> u16 {
        self.cell_width
    }

    /// Height of one square in terminal cells.
    pub fn cell_height(&self) -> u16 {
        self.cell_height
    }

    /// Side shown at the bottom.
    pub fn orientation(&self) -> Side {
        self.orientation
    }
}

/// What a key press means for the text box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Append a character.
    Insert(char),
    /// Delete the last character.
    Backspace,
    /// Submit the buffer.
    Submit,
    /// Leave the session.
    Quit,
    /// Nothing to do.
    None,
}

/// Interprets a key event.
pub fn key_action(key: KeyEvent) -> KeyAction {
    if key.kind != KeyEventKind::Press {
        return KeyAction::None;
    }
    match key.code {
        KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Enter => KeyAction::Submit,
        KeyCode::Backspace => KeyAction::Backspace,
        KeyCode::Char(c) if !c.is_control() => KeyAction::Insert(c),
        _ => KeyAction::None,
    }
}
