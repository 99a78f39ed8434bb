//! Win detection logic for tic-tac-toe.

use super::super::{Board, Piece, Position, Square};

/// The 8 winning lines, as board indices (`x + y * 3`).
pub const LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// Checks whether `piece` fills any row, column or diagonal.
pub fn check_piece_win(board: &Board, piece: Piece) -> bool {
    LINES.iter().any(|line| {
        line.iter()
            .all(|&i| board.get(Position::ALL[i]) == Square::Occupied(piece))
    })
}

/// Returns the piece with three in a row, if any.
///
/// Checks [`Piece::Nought`] first; a board where both pieces have a line
/// cannot arise from legal play.
pub fn winning_piece(board: &Board) -> Option<Piece> {
    [Piece::Nought, Piece::Cross]
        .into_iter()
        .find(|piece| check_piece_win(board, *piece))
}
