//! Session layer for shared tic-tac-toe.
//!
//! A match lives in a data share of a shared key-value store. This crate
//! defines the store and notifier contracts, in-memory implementations of
//! both, the lobby listing, and [`GameSessionController`], which runs the
//! compare-and-set move protocol on top of the
//! [`shared_tictactoe`] engine.
//!
//! # Example
//!
//! ```no_run
//! use shared_session::{GameSessionController, MemoryNotifier, MemoryStore};
//! use shared_tictactoe::Position;
//!
//! # async fn example() -> Result<(), shared_session::SessionError> {
//! let store = MemoryStore::new();
//! let notifier = MemoryNotifier::new();
//! let mut alice = GameSessionController::new(store.client("alice"), notifier.clone());
//! alice.create_game().await?;
//! alice.submit_move(Position::CENTER).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod lobby;
mod memory;
mod notify;
mod session;
mod store;

pub use config::{ConfigError, SessionConfig};
pub use error::{SessionError, StoreError, StoreErrorKind};
pub use lobby::{JoinableGame, JoinedGame, Lobby};
pub use memory::{MemoryNotifier, MemoryStore, MemoryStoreClient};
pub use notify::{Notification, NotificationKey, Notifier};
pub use session::{
    ForfeitOutcome, GameSessionController, JoinOutcome, PendingAction, SubmitOutcome, SubmitState,
};
pub use store::{AccessPolicy, ShareId, ShareInfo, SharedStore};
