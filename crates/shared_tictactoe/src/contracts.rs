//! Preconditions for mutating the local move log.
//!
//! Legality is judged against the locally derived board, not the raw log.

use super::error::GameError;
use super::game::TicTacToeGame;
use super::position::Position;
use tracing::{instrument, warn};

/// Precondition: The round must not have ended.
pub struct RoundInProgress;

impl RoundInProgress {
    /// Fails if the derived state records a round end.
    #[instrument(skip(game))]
    pub fn check(position: Position, game: &TicTacToeGame) -> Result<(), GameError> {
        match game.round_end() {
            Some(end) => {
                warn!(%position, round_end = %end, "Move attempted after round end");
                Err(GameError::illegal_move(position, "round is over"))
            }
            None => Ok(()),
        }
    }
}

/// Precondition: The square at the move's position must be empty.
pub struct SquareIsEmpty;

impl SquareIsEmpty {
    /// Fails if the derived board already holds a piece at `position`.
    #[instrument(skip(game))]
    pub fn check(position: Position, game: &TicTacToeGame) -> Result<(), GameError> {
        if game.board().is_empty(position) {
            Ok(())
        } else {
            warn!(%position, "Move attempted on occupied square");
            Err(GameError::illegal_move(position, "square is occupied"))
        }
    }
}

/// Composite precondition: a placement is legal if the round is live and the square is empty.
pub struct LegalMove;

impl LegalMove {
    /// Validates all preconditions for a placement.
    pub fn check(position: Position, game: &TicTacToeGame) -> Result<(), GameError> {
        RoundInProgress::check(position, game)?;
        SquareIsEmpty::check(position, game)?;
        Ok(())
    }
}
