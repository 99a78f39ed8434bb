//! Error types for the shared store and the session controller.

use derive_more::{Display, Error};
use shared_tictactoe::{GameError, Position};
use tracing::instrument;

/// Why a store operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum StoreErrorKind {
    /// The value was written by someone else since this handle last saw it.
    Changed,
    /// The share does not exist.
    NotFound,
    /// The backend could not be reached.
    Transport,
    /// The user may not perform the operation.
    Permission,
}

/// Store error with a failure kind.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Store error ({}): {}", kind, message)]
pub struct StoreError {
    /// Failure kind.
    pub kind: StoreErrorKind,
    /// Error message.
    pub message: String,
}

impl StoreError {
    /// Creates a new store error.
    #[instrument(skip(message))]
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Compare-and-set lost against a newer value.
    pub fn changed(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Changed, message)
    }

    /// Unknown share.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound, message)
    }

    /// Backend unreachable.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Transport, message)
    }

    /// Operation not allowed for this user.
    pub fn permission(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Permission, message)
    }

    /// Returns true if the failure is a lost compare-and-set.
    pub fn is_changed(&self) -> bool {
        self.kind == StoreErrorKind::Changed
    }
}

/// Error returned by session controller operations.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum SessionError {
    /// The engine refused a snapshot or a log mutation.
    #[display("Game error: {}", _0)]
    Game(GameError),

    /// The stored snapshot changed under a write.
    #[display("Game state was changed by another player")]
    ConcurrentWriteConflict,

    /// The store failed for a reason other than a lost compare-and-set.
    #[display("Store fault: {}", _0)]
    StoreFault(StoreError),

    /// The cell is occupied or the round is over.
    #[display("Illegal move at {}", position)]
    IllegalMove {
        /// Refused target.
        position: Position,
    },

    /// No game is selected.
    #[display("No active game")]
    NoActiveGame,

    /// A previous submission has not finished.
    #[display("A write is already in flight")]
    WriteInFlight,

    /// Forfeit kept losing compare-and-set races.
    #[display("Gave up after {} conflicting writes", attempts)]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
    },
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Game(e) => Some(e),
            SessionError::StoreFault(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GameError> for SessionError {
    fn from(err: GameError) -> Self {
        Self::Game(err)
    }
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        if err.is_changed() {
            Self::ConcurrentWriteConflict
        } else {
            Self::StoreFault(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_maps_to_conflict() {
        let err: SessionError = StoreError::changed("stale").into();
        assert_eq!(err, SessionError::ConcurrentWriteConflict);
    }

    #[test]
    fn test_other_kinds_map_to_fault() {
        let err: SessionError = StoreError::transport("offline").into();
        assert!(matches!(err, SessionError::StoreFault(ref e) if e.kind == StoreErrorKind::Transport));
        assert_eq!(
            err.to_string(),
            "Store fault: Store error (transport): offline"
        );
    }
}
