//! Game session controller.
//!
//! The controller owns the engines of every joined game, the store and
//! notifier handles, and the current selection. Every write of the move
//! log goes through compare-and-set; a lost race re-reads the stored log,
//! which discards the local speculative mutation.

use crate::config::SessionConfig;
use crate::error::{SessionError, StoreError};
use crate::lobby::{JoinableGame, JoinedGame, Lobby};
use crate::notify::{Notification, NotificationKey, Notifier};
use crate::store::{ShareId, SharedStore};
use shared_tictactoe::{Position, RoundEnd, TicTacToeGame};
use std::collections::HashMap;
use tracing::{debug, error, info, instrument, warn};

/// Log mutation waiting on its compare-and-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    /// A placement.
    Place(Position),
    /// A forfeit.
    Forfeit,
}

/// Progress of the current submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitState {
    /// No submission running.
    #[default]
    Idle,
    /// Local log mutated, compare-and-set not yet answered.
    AwaitingWrite(PendingAction),
    /// Compare-and-set lost; re-reading the stored log.
    ResolvingConflict(PendingAction),
}

/// Result of [`GameSessionController::submit_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The move was stored.
    Applied,
    /// Someone else wrote first; the move was dropped and the stored log loaded.
    Conflicted,
    /// It was not the local player's turn; the stored log was re-read.
    NotYourTurn,
}

/// Result of [`GameSessionController::forfeit_game`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForfeitOutcome {
    /// The forfeit was stored after `attempts` compare-and-set attempts.
    Forfeited {
        /// Attempts made, including the successful one.
        attempts: u32,
    },
    /// The round had already ended; nothing was written.
    RoundAlreadyOver(RoundEnd),
}

/// Result of [`GameSessionController::join_game`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Joined; the game is now current.
    Joined,
    /// The share was no longer joinable.
    Rejected,
    /// Someone else joined at the same time; the share was left again.
    Overfull,
}

/// Drives one user's games against the shared store.
pub struct GameSessionController<S, N> {
    store: S,
    notifier: N,
    config: SessionConfig,
    games: HashMap<ShareId, TicTacToeGame>,
    current: Option<ShareId>,
    lobby: Lobby,
    submit: SubmitState,
}

impl<S: SharedStore, N: Notifier> GameSessionController<S, N> {
    /// Creates a controller with the default configuration.
    pub fn new(store: S, notifier: N) -> Self {
        Self::with_config(store, notifier, SessionConfig::default())
    }

    /// Creates a controller.
    #[instrument(skip(store, notifier, config), fields(user = %store.username()))]
    pub fn with_config(store: S, notifier: N, config: SessionConfig) -> Self {
        info!("Creating session controller");
        Self {
            store,
            notifier,
            config,
            games: HashMap::new(),
            current: None,
            lobby: Lobby::default(),
            submit: SubmitState::Idle,
        }
    }

    /// Identity of the local player.
    pub fn username(&self) -> &str {
        self.store.username()
    }

    /// Configuration in use.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Lobby as of the last refresh.
    pub fn lobby(&self) -> &Lobby {
        &self.lobby
    }

    /// Share of the current game.
    pub fn current_share(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Engine of the current game.
    pub fn current_game(&self) -> Option<&TicTacToeGame> {
        self.current.as_ref().and_then(|id| self.games.get(id))
    }

    /// Engine of any loaded game.
    pub fn game(&self, share: &str) -> Option<&TicTacToeGame> {
        self.games.get(share)
    }

    /// State of the submission protocol.
    pub fn submit_state(&self) -> SubmitState {
        self.submit
    }

    /// Reloads every joined game and lists joinable ones.
    #[instrument(skip(self), fields(user = %self.store.username()))]
    pub async fn find_games(&mut self) -> Result<&Lobby, SessionError> {
        let username = self.store.username().to_string();
        let key = self.config.state_key().clone();

        let shares = self.store.find_joined().await?;
        let mut games = HashMap::new();
        let mut joined = Vec::with_capacity(shares.len());
        for share in &shares {
            let mut game = TicTacToeGame::new(username.as_str(), share.owner().as_str());
            for user in share.users() {
                game.player_joined(user);
            }
            if let Some(raw) = self.store.get(share.id(), &key).await? {
                if let Err(e) = game.update(Some(&raw)) {
                    warn!(share = %share.id(), error = %e, "Stored game state unusable");
                    joined.push(JoinedGame::unusable(share));
                    continue;
                }
            }
            joined.push(JoinedGame::new(share, Some(&game)));
            games.insert(share.id().clone(), game);
        }

        let joinable = self
            .store
            .find_joinable()
            .await?
            .iter()
            .map(JoinableGame::from)
            .collect::<Vec<_>>();

        info!(
            joined = joined.len(),
            joinable = joinable.len(),
            "Lobby refreshed"
        );
        self.games = games;
        let dropped = self
            .current
            .as_ref()
            .is_some_and(|current| !self.games.contains_key(current));
        if dropped {
            debug!("Current game no longer joined");
            self.current = None;
        }
        self.lobby = Lobby::new(joined, joinable);
        Ok(&self.lobby)
    }

    /// Creates a new game hosted by the local player and makes it current.
    #[instrument(skip(self), fields(user = %self.store.username()))]
    pub async fn create_game(&mut self) -> Result<ShareId, SessionError> {
        let share = self.store.create().await?;
        let username = self.store.username();
        let game = TicTacToeGame::new(username, username);
        let id = share.id().clone();
        self.games.insert(id.clone(), game);
        self.current = Some(id.clone());
        self.submit = SubmitState::Idle;
        info!(share = %id, "Created game");
        Ok(id)
    }

    /// Joins another user's game.
    #[instrument(skip(self), fields(user = %self.store.username()))]
    pub async fn join_game(&mut self, share: &str) -> Result<JoinOutcome, SessionError> {
        if !self.store.join(share).await? {
            info!(share, "Game no longer joinable");
            self.find_games().await?;
            return Ok(JoinOutcome::Rejected);
        }

        let info = self.store.info(share).await?;
        if info.users().len() > *self.config.max_players() {
            warn!(share, users = info.users().len(), "Too many players joined, leaving");
            self.store.leave(share).await?;
            self.find_games().await?;
            return Ok(JoinOutcome::Overfull);
        }

        self.store.set_joinable(share, false).await?;
        let game = TicTacToeGame::new(self.store.username(), info.owner().as_str());
        self.games.insert(share.to_string(), game);
        self.current = Some(share.to_string());
        self.submit = SubmitState::Idle;
        self.read_moves().await?;

        let text = format!("{} has joined your game", self.store.username());
        self.notify_other(NotificationKey::PlayerJoined, text).await;
        info!(share, host = %info.owner(), "Joined game");
        Ok(JoinOutcome::Joined)
    }

    /// Makes an already joined game current and reads its moves.
    #[instrument(skip(self), fields(user = %self.store.username()))]
    pub async fn play_game(&mut self, share: &str) -> Result<(), SessionError> {
        if !self.games.contains_key(share) {
            warn!(share, "Game not loaded");
            return Err(SessionError::NoActiveGame);
        }
        self.current = Some(share.to_string());
        self.read_moves().await
    }

    /// Loads the stored log of the current game.
    ///
    /// Any local mutation not yet stored is discarded. When nothing is
    /// stored yet the engine is reset to an empty log. A stored log that
    /// fails to load exits the game locally.
    #[instrument(skip(self), fields(user = %self.store.username()))]
    pub async fn read_moves(&mut self) -> Result<(), SessionError> {
        let share = self.current.clone().ok_or(SessionError::NoActiveGame)?;
        let raw = self.store.get(&share, self.config.state_key()).await?;
        let game = self
            .games
            .get_mut(&share)
            .ok_or(SessionError::NoActiveGame)?;
        match raw {
            Some(raw) => {
                if let Err(e) = game.update(Some(&raw)) {
                    error!(share = %share, error = %e, "Stored game state unusable");
                    self.exit_locally();
                    return Err(e.into());
                }
            }
            None => {
                debug!(share = %share, "No stored state yet");
                let mut fresh = TicTacToeGame::new(game.self_id(), game.host());
                for player in game.moves().keys() {
                    fresh.player_joined(player);
                }
                *game = fresh;
            }
        }
        self.submit = SubmitState::Idle;
        debug!(
            share = %share,
            status = %game.status(),
            "Moves read"
        );
        Ok(())
    }

    /// Places the local player's piece and stores the new log.
    #[instrument(skip(self), fields(user = %self.store.username()))]
    pub async fn submit_move(&mut self, position: Position) -> Result<SubmitOutcome, SessionError> {
        self.ensure_idle()?;
        let share = self.current.clone().ok_or(SessionError::NoActiveGame)?;
        let game = self
            .games
            .get_mut(&share)
            .ok_or(SessionError::NoActiveGame)?;

        if !game.current_player_turn() {
            debug!("Not our turn, re-reading");
            self.read_moves().await?;
            return Ok(SubmitOutcome::NotYourTurn);
        }
        if !game.can_move(position) {
            warn!(%position, "Move refused locally");
            return Err(SessionError::IllegalMove { position });
        }

        game.do_move(position)?;
        let value = game.serialize()?;
        let pending = PendingAction::Place(position);
        self.submit = SubmitState::AwaitingWrite(pending);

        match self.write(&share, &value).await {
            Ok(()) => {
                self.confirm_write(&share)?;
                self.notify_other(NotificationKey::YourTurn, "It's your turn".to_string())
                    .await;
                info!(%position, "Move stored");
                Ok(SubmitOutcome::Applied)
            }
            Err(e) if e.is_changed() => {
                info!(%position, "Lost write race, dropping move");
                self.resolve_conflict(pending).await?;
                Ok(SubmitOutcome::Conflicted)
            }
            Err(e) => Err(self.fault(e)),
        }
    }

    /// Forfeits the current game, retrying when another write gets in first.
    #[instrument(skip(self), fields(user = %self.store.username()))]
    pub async fn forfeit_game(&mut self) -> Result<ForfeitOutcome, SessionError> {
        self.ensure_idle()?;
        let share = self.current.clone().ok_or(SessionError::NoActiveGame)?;
        let mut attempts = 0u32;

        loop {
            let game = self
                .games
                .get_mut(&share)
                .ok_or(SessionError::NoActiveGame)?;
            if let Some(end) = game.round_end() {
                info!(round_end = %end, attempts, "Round already over, not forfeiting");
                return Ok(ForfeitOutcome::RoundAlreadyOver(end.clone()));
            }

            attempts += 1;
            game.forfeit()?;
            let value = game.serialize()?;
            self.submit = SubmitState::AwaitingWrite(PendingAction::Forfeit);

            match self.write(&share, &value).await {
                Ok(()) => {
                    self.confirm_write(&share)?;
                    let text = format!("{} forfeit the game", self.store.username());
                    self.notify_other(NotificationKey::Forfeit, text).await;
                    info!(attempts, "Forfeit stored");
                    return Ok(ForfeitOutcome::Forfeited { attempts });
                }
                Err(e) if e.is_changed() => {
                    self.resolve_conflict(PendingAction::Forfeit).await?;
                    if attempts > *self.config.max_forfeit_retries() {
                        warn!(attempts, "Forfeit retries exhausted");
                        return Err(SessionError::RetriesExhausted { attempts });
                    }
                    debug!(attempts, "Retrying forfeit on refreshed log");
                }
                Err(e) => return Err(self.fault(e)),
            }
        }
    }

    /// Leaves the current game for good and returns to the lobby.
    #[instrument(skip(self), fields(user = %self.store.username()))]
    pub async fn leave_game(&mut self) -> Result<(), SessionError> {
        let share = self.current.clone().ok_or(SessionError::NoActiveGame)?;
        self.store.leave(&share).await?;
        self.games.remove(&share);
        self.current = None;
        self.submit = SubmitState::Idle;
        info!(share = %share, "Left game");
        self.find_games().await?;
        Ok(())
    }

    /// Deselects the current game (still joined) and refreshes the lobby.
    #[instrument(skip(self), fields(user = %self.store.username()))]
    pub async fn to_lobby(&mut self) -> Result<&Lobby, SessionError> {
        self.current = None;
        self.submit = SubmitState::Idle;
        self.find_games().await
    }

    /// Reacts to a notification addressed to the local player.
    ///
    /// Only notifications about the current game have an effect.
    #[instrument(skip(self, notification), fields(user = %self.store.username(), key = %notification.key()))]
    pub async fn handle_notification(
        &mut self,
        notification: &Notification,
    ) -> Result<(), SessionError> {
        if self.current.as_deref() != Some(notification.share_id().as_str()) {
            debug!(share = %notification.share_id(), "Notification for another game ignored");
            return Ok(());
        }
        match notification.key() {
            NotificationKey::PlayerJoined => {
                let share = notification.share_id();
                if let Some(game) = self.games.get_mut(share) {
                    game.player_joined(notification.sender());
                    info!(player = %notification.sender(), "Player joined");
                }
                Ok(())
            }
            NotificationKey::YourTurn | NotificationKey::Forfeit => self.read_moves().await,
        }
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.submit == SubmitState::Idle {
            Ok(())
        } else {
            warn!(state = ?self.submit, "Submission refused, write in flight");
            Err(SessionError::WriteInFlight)
        }
    }

    async fn write(&self, share: &str, value: &str) -> Result<(), StoreError> {
        self.store
            .compare_and_set(share, self.config.state_key(), value, *self.config.access())
            .await
    }

    fn confirm_write(&mut self, share: &str) -> Result<(), SessionError> {
        if let Some(game) = self.games.get_mut(share) {
            game.update(None)?;
        }
        self.submit = SubmitState::Idle;
        Ok(())
    }

    async fn resolve_conflict(&mut self, pending: PendingAction) -> Result<(), SessionError> {
        self.submit = SubmitState::ResolvingConflict(pending);
        if let Err(e) = self.read_moves().await {
            error!(error = %e, "Could not reload game after conflict");
            self.exit_locally();
            return Err(e);
        }
        Ok(())
    }

    fn fault(&mut self, err: StoreError) -> SessionError {
        error!(error = %err, "Store failed during write");
        self.exit_locally();
        SessionError::StoreFault(err)
    }

    /// Drops the current game without telling the store.
    fn exit_locally(&mut self) {
        if let Some(share) = self.current.take() {
            self.games.remove(&share);
            warn!(share = %share, "Exited game locally");
        }
        self.submit = SubmitState::Idle;
    }

    async fn notify_other(&self, key: NotificationKey, text: String) {
        let Some(share) = self.current.as_ref() else {
            return;
        };
        let Some(other) = self.games.get(share).and_then(TicTacToeGame::other_user) else {
            debug!(%key, "No other player to notify");
            return;
        };
        let notification = Notification::new(
            key,
            share.clone(),
            text,
            self.store.username().to_string(),
            other.to_string(),
        );
        self.notifier.send_instant_notification(notification).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryNotifier, MemoryStore, MemoryStoreClient};

    fn controller(
        store: &MemoryStore,
        user: &str,
    ) -> GameSessionController<MemoryStoreClient, MemoryNotifier> {
        GameSessionController::new(store.client(user), MemoryNotifier::new())
    }

    #[tokio::test]
    async fn test_create_game_is_current() {
        let store = MemoryStore::new();
        let mut alice = controller(&store, "alice");
        let share = alice.create_game().await.unwrap();
        assert_eq!(alice.current_share(), Some(share.as_str()));
        let game = alice.current_game().unwrap();
        assert_eq!(game.host(), "alice");
        assert!(game.current_player_turn());
        assert_eq!(alice.submit_state(), SubmitState::Idle);
    }

    #[tokio::test]
    async fn test_operations_need_a_current_game() {
        let store = MemoryStore::new();
        let mut alice = controller(&store, "alice");
        assert_eq!(alice.read_moves().await, Err(SessionError::NoActiveGame));
        assert_eq!(
            alice.submit_move(Position::CENTER).await,
            Err(SessionError::NoActiveGame)
        );
        assert_eq!(alice.forfeit_game().await, Err(SessionError::NoActiveGame));
        assert_eq!(alice.leave_game().await, Err(SessionError::NoActiveGame));
    }

    #[tokio::test]
    async fn test_write_in_flight_refused() {
        let store = MemoryStore::new();
        let mut alice = controller(&store, "alice");
        alice.create_game().await.unwrap();
        alice.submit = SubmitState::AwaitingWrite(PendingAction::Place(Position::CENTER));
        assert_eq!(
            alice.submit_move(Position::CENTER).await,
            Err(SessionError::WriteInFlight)
        );
        assert_eq!(alice.forfeit_game().await, Err(SessionError::WriteInFlight));

        // Re-reading the stored log abandons the stuck submission.
        alice.read_moves().await.unwrap();
        assert_eq!(alice.submit_state(), SubmitState::Idle);
    }

    #[tokio::test]
    async fn test_occupied_square_refused_before_write() {
        let store = MemoryStore::new();
        let mut alice = controller(&store, "alice");
        alice.create_game().await.unwrap();
        let game = alice.games.values_mut().next().unwrap();
        game.update(Some(r#"{"moves":{"alice":[],"bob":[[1,1]]},"firstMove":"bob"}"#))
            .unwrap();
        assert_eq!(
            alice.submit_move(Position::CENTER).await,
            Err(SessionError::IllegalMove {
                position: Position::CENTER
            })
        );
    }
}
