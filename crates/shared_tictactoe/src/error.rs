//! Errors raised by the game state engine.

use super::position::Position;

/// Error that can occur when decoding a snapshot or mutating the move log.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum GameError {
    /// A stored snapshot does not match the expected shape.
    #[display("Malformed snapshot: {}", _0)]
    MalformedSnapshot(String),

    /// Two logged moves target the same cell.
    #[display("Move log places two pieces on {}", _0)]
    CellConflict(Position),

    /// A move was attempted on an occupied cell or after the round ended.
    #[display("Illegal move at {}: {}", position, reason)]
    IllegalMove {
        /// Target of the refused move.
        position: Position,
        /// Why the move was refused.
        reason: String,
    },

    /// Coordinates outside the 3x3 board.
    #[display("Position ({}, {}) is off the board", x, y)]
    OutOfBounds {
        /// Column.
        x: u8,
        /// Row.
        y: u8,
    },

    /// The local player already has a forfeit marker in the log.
    #[display("Player has already forfeited")]
    AlreadyForfeited,

    /// The snapshot could not be encoded.
    #[display("Failed to encode snapshot: {}", _0)]
    Encode(String),
}

impl std::error::Error for GameError {}

impl GameError {
    /// Creates an illegal move error.
    pub fn illegal_move(position: Position, reason: impl Into<String>) -> Self {
        Self::IllegalMove {
            position,
            reason: reason.into(),
        }
    }
}
