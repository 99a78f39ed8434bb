//! Core domain types for tic-tac-toe.

use super::position::Position;
use serde::{Deserialize, Serialize};

/// Piece placed on the board.
///
/// Pieces are assigned by role, not by move order: the host of a match
/// always plays [`Piece::Nought`], every other participant plays
/// [`Piece::Cross`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Piece {
    /// Host piece ("O").
    #[strum(serialize = "O")]
    Nought,
    /// Guest piece ("X").
    #[strum(serialize = "X")]
    Cross,
}

/// A square on the tic-tac-toe board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Square {
    /// Empty square.
    #[default]
    Empty,
    /// Square occupied by a piece.
    Occupied(Piece),
}

/// 3x3 tic-tac-toe board.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    /// Squares indexed by `x + y * 3`.
    squares: [Square; 9],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the square at the given position.
    pub fn get(&self, pos: Position) -> Square {
        self.squares[pos.to_index()]
    }

    /// Sets the square at the given position.
    pub fn set(&mut self, pos: Position, square: Square) {
        self.squares[pos.to_index()] = square;
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Square::Empty
    }

    /// Returns all squares as a slice.
    pub fn squares(&self) -> &[Square; 9] {
        &self.squares
    }

    /// Number of occupied squares.
    pub fn occupied(&self) -> usize {
        self.squares.iter().filter(|s| **s != Square::Empty).count()
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for y in 0..3 {
            for x in 0..3 {
                let symbol = match self.squares[x + y * 3] {
                    Square::Empty => ".".to_string(),
                    Square::Occupied(piece) => piece.to_string(),
                };
                result.push_str(&symbol);
                if x < 2 {
                    result.push('|');
                }
            }
            if y < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_display() {
        let mut board = Board::new();
        board.set(Position::CENTER, Square::Occupied(Piece::Nought));
        board.set(Position::from_index(2).unwrap(), Square::Occupied(Piece::Cross));
        assert_eq!(board.display(), ".|.|X\n-+-+-\n.|O|.\n-+-+-\n.|.|.");
        assert_eq!(board.occupied(), 2);
    }

    #[test]
    fn test_piece_labels() {
        assert_eq!(Piece::Nought.to_string(), "O");
        assert_eq!(Piece::Cross.to_string(), "X");
    }
}
