//! Tic-tac-toe state engine for matches played over a shared key-value store.
//!
//! Each participant appends to their own sequence in a per-player move log.
//! The log is the only persisted state; the board, whose turn it is and how
//! the round ended are all recomputed from it by [`TicTacToeGame`].
//!
//! ```
//! use shared_tictactoe::{Position, TicTacToeGame};
//!
//! let mut game = TicTacToeGame::new("alice", "alice");
//! game.do_move(Position::CENTER).unwrap();
//! game.update(None).unwrap();
//! assert!(!game.current_player_turn());
//! assert_eq!(
//!     game.serialize().unwrap(),
//!     r#"{"moves":{"alice":[[1,1]]},"firstMove":"alice"}"#
//! );
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod contracts;
mod error;
mod game;
pub mod invariants;
mod outcome;
mod position;
pub mod rules;
mod snapshot;
mod types;

pub use action::{FORFEIT_MARKER, MoveEntry};
pub use contracts::{LegalMove, RoundInProgress, SquareIsEmpty};
pub use error::GameError;
pub use game::TicTacToeGame;
pub use invariants::{Invariant, InvariantSet, InvariantViolation, TicTacToeInvariants};
pub use outcome::{GameStatus, RoundEnd};
pub use position::Position;
pub use snapshot::{MoveLog, PlayerId, Snapshot};
pub use types::{Board, Piece, Square};
