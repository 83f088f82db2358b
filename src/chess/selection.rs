//! The human's in-progress piece selection.

use shakmaty::Square;
use tracing::instrument;

/// Currently selected square plus the squares it may legally move to.
///
/// Non-empty only while the selected square holds a piece of the side to
/// move; the turn machine clears it after every completed move and after
/// every click on a non-destination square.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    square: Option<Square>,
    destinations: Vec<Square>,
}

impl Selection {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects `square` with its legal destinations.
    #[instrument(skip(self, destinations), fields(count = destinations.len()))]
    pub fn select(&mut self, square: Square, destinations: Vec<Square>) {
        self.square = Some(square);
        self.destinations = destinations;
    }

    /// Drops any selection.
    pub fn clear(&mut self) {
        self.square = None;
        self.destinations.clear();
    }

    /// The selected square, if any.
    pub fn square(&self) -> Option<Square> {
        self.square
    }

    /// Legal destinations from the selected square.
    pub fn destinations(&self) -> &[Square] {
        &self.destinations
    }

    /// Returns true if `square` is one of the legal destinations.
    pub fn is_destination(&self, square: Square) -> bool {
        self.destinations.contains(&square)
    }

    /// Returns true if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.square.is_none()
    }
}
