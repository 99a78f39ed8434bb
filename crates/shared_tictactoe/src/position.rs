//! Board coordinates for tic-tac-toe moves.

use super::error::GameError;
use serde::{Deserialize, Serialize};

/// A cell on the board, addressed by column `x` and row `y` (both 0-2).
///
/// On the wire a position is the two-element array `[x, y]`; decoding
/// rejects anything outside the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "[u8; 2]", into = "[u8; 2]")]
pub struct Position {
    x: u8,
    y: u8,
}

impl Position {
    /// Center cell.
    pub const CENTER: Position = Position { x: 1, y: 1 };

    /// All 9 positions, in board index order.
    pub const ALL: [Position; 9] = [
        Position { x: 0, y: 0 },
        Position { x: 1, y: 0 },
        Position { x: 2, y: 0 },
        Position { x: 0, y: 1 },
        Position { x: 1, y: 1 },
        Position { x: 2, y: 1 },
        Position { x: 0, y: 2 },
        Position { x: 1, y: 2 },
        Position { x: 2, y: 2 },
    ];

    /// Creates a position, checking both coordinates are on the board.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] if `x` or `y` is greater than 2.
    pub fn new(x: u8, y: u8) -> Result<Self, GameError> {
        if x > 2 || y > 2 {
            return Err(GameError::OutOfBounds { x, y });
        }
        Ok(Self { x, y })
    }

    /// Column (0-2).
    pub fn x(self) -> u8 {
        self.x
    }

    /// Row (0-2).
    pub fn y(self) -> u8 {
        self.y
    }

    /// Converts position to board index (`x + y * 3`).
    pub fn to_index(self) -> usize {
        self.x as usize + self.y as usize * 3
    }

    /// Creates position from board index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Get label for this position (for display).
    pub fn label(self) -> &'static str {
        match self.to_index() {
            0 => "Top-left",
            1 => "Top-center",
            2 => "Top-right",
            3 => "Middle-left",
            4 => "Center",
            5 => "Middle-right",
            6 => "Bottom-left",
            7 => "Bottom-center",
            _ => "Bottom-right",
        }
    }
}

impl TryFrom<[u8; 2]> for Position {
    type Error = GameError;

    fn try_from([x, y]: [u8; 2]) -> Result<Self, Self::Error> {
        Self::new(x, y)
    }
}

impl From<Position> for [u8; 2] {
    fn from(pos: Position) -> Self {
        [pos.x, pos.y]
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_to_index() {
        assert_eq!(Position::new(0, 0).unwrap().to_index(), 0);
        assert_eq!(Position::new(2, 0).unwrap().to_index(), 2);
        assert_eq!(Position::new(0, 1).unwrap().to_index(), 3);
        assert_eq!(Position::CENTER.to_index(), 4);
        assert_eq!(Position::new(2, 2).unwrap().to_index(), 8);
    }

    #[test]
    fn test_position_from_index() {
        assert_eq!(Position::from_index(4), Some(Position::CENTER));
        assert_eq!(Position::from_index(5), Position::new(2, 1).ok());
        assert_eq!(Position::from_index(9), None);
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        assert_eq!(
            Position::new(3, 0),
            Err(GameError::OutOfBounds { x: 3, y: 0 })
        );
        assert!(Position::new(0, 7).is_err());
    }

    #[test]
    fn test_wire_form_is_pair() {
        let pos = Position::new(2, 1).unwrap();
        assert_eq!(serde_json::to_string(&pos).unwrap(), "[2,1]");
        let back: Position = serde_json::from_str("[2,1]").unwrap();
        assert_eq!(back, pos);
        assert!(serde_json::from_str::<Position>("[1,3]").is_err());
        assert!(serde_json::from_str::<Position>("[-1,0]").is_err());
        assert!(serde_json::from_str::<Position>("[1]").is_err());
    }
}
