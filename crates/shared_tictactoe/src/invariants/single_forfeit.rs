//! Single forfeit invariant.

use super::super::TicTacToeGame;
use super::Invariant;

/// Invariant: no player carries more than one forfeit marker.
pub struct SingleForfeitInvariant;

impl Invariant<TicTacToeGame> for SingleForfeitInvariant {
    fn holds(game: &TicTacToeGame) -> bool {
        game.moves()
            .values()
            .all(|entries| entries.iter().filter(|e| e.is_forfeit()).count() <= 1)
    }

    fn description() -> &'static str {
        "Each player forfeits at most once"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forfeit_once_holds() {
        let mut game = TicTacToeGame::new("alice", "alice");
        game.forfeit().unwrap();
        assert!(SingleForfeitInvariant::holds(&game));
    }
}
