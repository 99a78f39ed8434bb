//! Game state engine for shared tic-tac-toe.
//!
//! The engine owns the move log of one match. Board, turn and round end
//! are never stored: they are recomputed from the log every time it
//! changes, so a snapshot read from the shared store fully determines
//! what the local player sees.

use super::action::MoveEntry;
use super::contracts::LegalMove;
use super::error::GameError;
use super::invariants::{InvariantSet, InvariantViolation, TicTacToeInvariants};
use super::outcome::{GameStatus, RoundEnd};
use super::position::Position;
use super::rules;
use super::snapshot::{MoveLog, PlayerId, Snapshot};
use super::types::{Board, Piece, Square};
use tracing::{debug, error, info, instrument, warn};

/// State recomputed from the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Derived {
    board: Board,
    round_end: Option<RoundEnd>,
    current_player_turn: bool,
}

impl Default for Derived {
    fn default() -> Self {
        Self {
            board: Board::new(),
            round_end: None,
            current_player_turn: true,
        }
    }
}

/// Tic-tac-toe match as seen by one local player.
#[derive(Debug, Clone)]
pub struct TicTacToeGame {
    self_id: PlayerId,
    host: PlayerId,
    snapshot: Snapshot,
    derived: Derived,
}

impl TicTacToeGame {
    /// Creates a game for `self_id` in a match hosted by `host`.
    ///
    /// The log starts with empty sequences for the local player and the host.
    pub fn new(self_id: impl Into<PlayerId>, host: impl Into<PlayerId>) -> Self {
        let self_id = self_id.into();
        let host = host.into();
        let mut snapshot = Snapshot::default();
        snapshot.moves.insert(self_id.clone(), Vec::new());
        snapshot.moves.entry(host.clone()).or_default();
        debug!(%self_id, %host, "Created game");
        Self {
            self_id,
            host,
            snapshot,
            derived: Derived::default(),
        }
    }

    /// Replaces the log with a stored snapshot (if given) and recomputes derived state.
    ///
    /// With `None` the derived state is recomputed from the current local log,
    /// which is how a confirmed local move becomes visible.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MalformedSnapshot`] if the snapshot fails to decode
    /// and [`GameError::CellConflict`] if two moves share a cell. In both cases
    /// the previous state is kept.
    #[instrument(skip(self, serialized), fields(self_id = %self.self_id, replace = serialized.is_some()))]
    pub fn update(&mut self, serialized: Option<&str>) -> Result<(), GameError> {
        match serialized {
            Some(raw) => {
                let snapshot = Snapshot::decode(raw)?;
                self.apply_snapshot(snapshot)
            }
            None => self.refresh(),
        }
    }

    /// Replaces the log with an already decoded snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CellConflict`] if two moves share a cell; the
    /// previous state is kept.
    #[instrument(skip(self, snapshot), fields(self_id = %self.self_id))]
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) -> Result<(), GameError> {
        let derived = self.derive(&snapshot)?;
        self.snapshot = snapshot;
        self.commit(derived);
        Ok(())
    }

    /// Recomputes derived state from the current local log.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CellConflict`] if two moves share a cell.
    #[instrument(skip(self), fields(self_id = %self.self_id))]
    pub fn refresh(&mut self) -> Result<(), GameError> {
        let derived = self.derive(&self.snapshot)?;
        self.commit(derived);
        Ok(())
    }

    fn commit(&mut self, derived: Derived) {
        self.derived = derived;
        if let Err(violations) = self.check_invariants() {
            for violation in violations {
                warn!(invariant = %violation.description, "Move log violates invariant");
            }
        }
        debug!(
            occupied = self.derived.board.occupied(),
            round_end = ?self.derived.round_end,
            current_player_turn = self.derived.current_player_turn,
            "Derived state recomputed"
        );
    }

    /// Folds the log into board, round end and turn.
    ///
    /// A win always takes precedence over a forfeit, whatever order the
    /// players appear in; among several of the same kind the first player
    /// in log order is reported.
    fn derive(&self, snapshot: &Snapshot) -> Result<Derived, GameError> {
        let mut board = Board::new();
        let mut winner: Option<&PlayerId> = None;
        let mut forfeited: Option<&PlayerId> = None;

        for (player, entries) in &snapshot.moves {
            let piece = self.player_piece(player);
            for entry in entries {
                match entry {
                    MoveEntry::Place(pos) => {
                        if !board.is_empty(*pos) {
                            error!(%player, position = %pos, "Two moves target the same cell");
                            return Err(GameError::CellConflict(*pos));
                        }
                        board.set(*pos, Square::Occupied(piece));
                    }
                    MoveEntry::Forfeit => {
                        forfeited.get_or_insert(player);
                    }
                }
            }
            if winner.is_none() && rules::check_piece_win(&board, piece) {
                winner = Some(player);
            }
        }

        let round_end = match (winner, forfeited) {
            (Some(player), _) => Some(RoundEnd::Win(player.clone())),
            (None, Some(player)) => Some(RoundEnd::Forfeit(player.clone())),
            (None, None) if rules::is_draw(&board) => Some(RoundEnd::Draw),
            (None, None) => None,
        };

        Ok(Derived {
            board,
            round_end,
            current_player_turn: self.turn_of_self(snapshot),
        })
    }

    /// Turn ownership from first mover and placement counts.
    fn turn_of_self(&self, snapshot: &Snapshot) -> bool {
        let mine = snapshot.placements(&self.self_id);
        let others: usize = snapshot
            .moves
            .keys()
            .filter(|player| **player != self.self_id)
            .map(|player| snapshot.placements(player))
            .sum();
        match snapshot.first_move.as_deref() {
            None => true,
            Some(first) if first == self.self_id => mine == others,
            Some(_) => mine < others,
        }
    }

    /// Encodes the current log in its canonical wire form.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Encode`] if serialization fails.
    pub fn serialize(&self) -> Result<String, GameError> {
        self.snapshot.encode()
    }

    /// Appends a placement for the local player.
    ///
    /// Legality is checked against the locally derived board. The derived
    /// state is not recomputed: the caller persists the new log first and
    /// then calls [`TicTacToeGame::update`] with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::IllegalMove`] if the round has ended or the
    /// square is occupied.
    #[instrument(skip(self), fields(self_id = %self.self_id))]
    pub fn do_move(&mut self, position: Position) -> Result<(), GameError> {
        LegalMove::check(position, self)?;
        self.snapshot
            .moves
            .entry(self.self_id.clone())
            .or_default()
            .push(MoveEntry::Place(position));
        if self.snapshot.first_move.is_none() {
            self.snapshot.first_move = Some(self.self_id.clone());
        }
        info!(%position, "Move appended to local log");
        Ok(())
    }

    /// Appends a forfeit marker for the local player.
    ///
    /// Forfeiting is legal at any time, including on the other player's turn.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::AlreadyForfeited`] if the local player already
    /// has a forfeit marker.
    #[instrument(skip(self), fields(self_id = %self.self_id))]
    pub fn forfeit(&mut self) -> Result<(), GameError> {
        if self.snapshot.has_forfeited(&self.self_id) {
            warn!("Player tried to forfeit twice");
            return Err(GameError::AlreadyForfeited);
        }
        self.snapshot
            .moves
            .entry(self.self_id.clone())
            .or_default()
            .push(MoveEntry::Forfeit);
        info!("Forfeit appended to local log");
        Ok(())
    }

    /// Returns true if the round is live and the square is empty.
    pub fn can_move(&self, position: Position) -> bool {
        self.derived.round_end.is_none() && self.derived.board.is_empty(position)
    }

    /// Returns true if `piece` has three in a row on the derived board.
    pub fn check_piece_win(&self, piece: Piece) -> bool {
        rules::check_piece_win(&self.derived.board, piece)
    }

    /// Piece played by `player`: the host plays noughts, everyone else crosses.
    pub fn player_piece(&self, player: &str) -> Piece {
        if player == self.host {
            Piece::Nought
        } else {
            Piece::Cross
        }
    }

    /// Ensures `player` has a (possibly empty) sequence in the log.
    #[instrument(skip(self), fields(self_id = %self.self_id))]
    pub fn player_joined(&mut self, player: &str) {
        if !self.snapshot.moves.contains_key(player) {
            debug!(player, "Adding empty move sequence");
            self.snapshot.moves.insert(player.to_string(), Vec::new());
        }
    }

    /// First player in the log other than the local player.
    pub fn other_user(&self) -> Option<&str> {
        self.snapshot
            .moves
            .keys()
            .find(|player| **player != self.self_id)
            .map(String::as_str)
    }

    /// Players to list for this match: self, the opponent if known, else the host.
    pub fn users(&self) -> Vec<&str> {
        let mut users = vec![self.self_id.as_str()];
        if let Some(other) = self.other_user() {
            users.push(other);
        }
        if users.len() < 2 && self.host != self.self_id {
            users.push(self.host.as_str());
        }
        users
    }

    /// Status of the match from the local player's point of view.
    pub fn status(&self) -> GameStatus {
        if let Some(end) = &self.derived.round_end {
            GameStatus::Finished(end.clone())
        } else if self.snapshot.first_move.is_none() {
            GameStatus::AwaitingFirstMove
        } else if self.derived.current_player_turn {
            GameStatus::YourTurn
        } else {
            GameStatus::OpponentTurn
        }
    }

    /// Checks the game invariants against the current log and derived board.
    ///
    /// # Errors
    ///
    /// Returns every violated invariant.
    pub fn check_invariants(&self) -> Result<(), Vec<InvariantViolation>> {
        TicTacToeInvariants::check_all(self)
    }

    /// Local player identity.
    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    /// Host identity.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Derived board.
    pub fn board(&self) -> &Board {
        &self.derived.board
    }

    /// Round end, if the round is over.
    pub fn round_end(&self) -> Option<&RoundEnd> {
        self.derived.round_end.as_ref()
    }

    /// Whether the local player may place a piece now.
    pub fn current_player_turn(&self) -> bool {
        self.derived.current_player_turn
    }

    /// Player who took the first placement.
    pub fn first_move(&self) -> Option<&str> {
        self.snapshot.first_move.as_deref()
    }

    /// The move log.
    pub fn moves(&self) -> &MoveLog {
        &self.snapshot.moves
    }

    /// The current snapshot (log plus first mover).
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}
