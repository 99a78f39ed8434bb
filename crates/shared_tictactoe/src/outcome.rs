//! Round end and status types derived from the move log.

use super::snapshot::PlayerId;
use serde::{Deserialize, Serialize};

/// Terminal status of a round.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundEnd {
    /// Player completed three in a row.
    Win(PlayerId),
    /// Player gave up.
    Forfeit(PlayerId),
    /// Board filled with no winner.
    Draw,
}

impl std::fmt::Display for RoundEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundEnd::Win(player) => write!(f, "{} wins!", player),
            RoundEnd::Forfeit(player) => write!(f, "{} forfeit!", player),
            RoundEnd::Draw => write!(f, "Draw"),
        }
    }
}

/// Status of a game as seen by the local player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Nobody has placed a piece yet; either player may start.
    AwaitingFirstMove,
    /// Local player may move.
    YourTurn,
    /// Waiting on the other player.
    OpponentTurn,
    /// Round is over.
    Finished(RoundEnd),
}

impl GameStatus {
    /// Returns true if the round is over.
    pub fn is_finished(&self) -> bool {
        matches!(self, GameStatus::Finished(_))
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameStatus::AwaitingFirstMove => write!(f, "Either player can take the first move"),
            GameStatus::YourTurn => write!(f, "It's your turn"),
            GameStatus::OpponentTurn => write!(f, "Waiting for other player's turn"),
            GameStatus::Finished(end) => write!(f, "{}", end),
        }
    }
}
