//! Board matches log invariant: every placement shows up on the board.

use super::super::TicTacToeGame;
use super::Invariant;

/// Invariant: the derived board holds exactly one piece per logged placement.
pub struct BoardMatchesLogInvariant;

impl Invariant<TicTacToeGame> for BoardMatchesLogInvariant {
    fn holds(game: &TicTacToeGame) -> bool {
        game.board().occupied() == game.snapshot().total_placements()
    }

    fn description() -> &'static str {
        "Derived board holds one piece per logged placement"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    #[test]
    fn test_holds_after_recompute() {
        let mut game = TicTacToeGame::new("alice", "alice");
        game.do_move(Position::CENTER).unwrap();
        game.update(None).unwrap();
        assert!(BoardMatchesLogInvariant::holds(&game));
    }

    #[test]
    fn test_pending_move_not_yet_on_board() {
        let mut game = TicTacToeGame::new("alice", "alice");
        game.do_move(Position::CENTER).unwrap();
        assert!(!BoardMatchesLogInvariant::holds(&game));
    }
}
