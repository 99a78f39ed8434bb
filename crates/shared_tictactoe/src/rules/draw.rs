//! Draw detection logic for tic-tac-toe.

use super::super::{Board, Square};
use super::win::winning_piece;

/// Checks if the board is full (all squares occupied).
pub fn is_full(board: &Board) -> bool {
    board.squares().iter().all(|s| *s != Square::Empty)
}

/// A full board with no winner.
pub fn is_draw(board: &Board) -> bool {
    is_full(board) && winning_piece(board).is_none()
}

#[cfg(test)]
mod tests {
    use super::super::super::{Piece, Position};
    use super::*;

    fn fill(board: &mut Board, pieces: [Piece; 9]) {
        for (pos, piece) in Position::ALL.into_iter().zip(pieces) {
            board.set(pos, Square::Occupied(piece));
        }
    }

    #[test]
    fn test_empty_board_not_full() {
        let board = Board::new();
        assert!(!is_full(&board));
    }

    #[test]
    fn test_partial_board_not_full() {
        let mut board = Board::new();
        board.set(Position::CENTER, Square::Occupied(Piece::Cross));
        assert!(!is_full(&board));
    }

    #[test]
    fn test_draw_detection() {
        use Piece::{Cross as X, Nought as O};
        let mut board = Board::new();
        // X O X / O X X / O X O
        fill(&mut board, [X, O, X, O, X, X, O, X, O]);
        assert!(is_full(&board));
        assert!(is_draw(&board));
    }

    #[test]
    fn test_not_draw_if_winner() {
        use Piece::{Cross as X, Nought as O};
        let mut board = Board::new();
        fill(&mut board, [X, X, X, O, O, X, X, O, O]);
        assert!(is_full(&board));
        assert!(!is_draw(&board));
    }
}
