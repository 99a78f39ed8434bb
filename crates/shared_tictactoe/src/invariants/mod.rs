//! First-class invariants for shared tic-tac-toe.
//!
//! The move log arrives from a store any participant can write to, so
//! these properties are not guaranteed by construction. The engine checks
//! them after every recompute and logs violations instead of refusing
//! the snapshot.

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
///
/// Implementations are provided for tuples.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

fn collect(violations: Vec<InvariantViolation>) -> Result<(), Vec<InvariantViolation>> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        if !I1::holds(state) {
            violations.push(InvariantViolation::new(I1::description()));
        }
        if !I2::holds(state) {
            violations.push(InvariantViolation::new(I2::description()));
        }
        if !I3::holds(state) {
            violations.push(InvariantViolation::new(I3::description()));
        }
        collect(violations)
    }
}

impl<S, I1, I2> InvariantSet<S> for (I1, I2)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        if !I1::holds(state) {
            violations.push(InvariantViolation::new(I1::description()));
        }
        if !I2::holds(state) {
            violations.push(InvariantViolation::new(I2::description()));
        }
        collect(violations)
    }
}

pub mod board_matches_log;
pub mod single_forfeit;
pub mod turn_balance;

pub use board_matches_log::BoardMatchesLogInvariant;
pub use single_forfeit::SingleForfeitInvariant;
pub use turn_balance::TurnBalanceInvariant;

/// All tic-tac-toe invariants as a composable set.
pub type TicTacToeInvariants = (
    BoardMatchesLogInvariant,
    TurnBalanceInvariant,
    SingleForfeitInvariant,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TicTacToeGame;

    #[test]
    fn test_invariant_set_holds_for_new_game() {
        let game = TicTacToeGame::new("bob", "alice");
        assert!(TicTacToeInvariants::check_all(&game).is_ok());
    }

    #[test]
    fn test_invariant_set_detects_unbalanced_log() {
        let mut game = TicTacToeGame::new("bob", "alice");
        game.update(Some(
            r#"{"moves":{"alice":[[0,0],[1,0],[2,2]],"bob":[]},"firstMove":"alice"}"#,
        ))
        .unwrap();
        let violations = TicTacToeInvariants::check_all(&game).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].description, TurnBalanceInvariant::description());
    }

    #[test]
    fn test_two_invariants_as_set() {
        let game = TicTacToeGame::new("alice", "alice");
        type TwoInvariants = (BoardMatchesLogInvariant, SingleForfeitInvariant);
        assert!(TwoInvariants::check_all(&game).is_ok());
    }
}
