//! Turn balance invariant: players take turns starting with the first mover.

use super::super::TicTacToeGame;
use super::Invariant;

/// Invariant: the first mover has made as many placements as everyone
/// else combined, or exactly one more. With no first mover nobody has
/// placed anything.
pub struct TurnBalanceInvariant;

impl Invariant<TicTacToeGame> for TurnBalanceInvariant {
    fn holds(game: &TicTacToeGame) -> bool {
        let snapshot = game.snapshot();
        match game.first_move() {
            None => snapshot.total_placements() == 0,
            Some(first) => {
                let leader = snapshot.placements(first);
                let rest = snapshot.total_placements() - leader;
                leader == rest || leader == rest + 1
            }
        }
    }

    fn description() -> &'static str {
        "Placements alternate starting with the first mover"
    }
}
