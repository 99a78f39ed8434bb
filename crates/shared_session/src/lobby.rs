//! Lobby listing: games the user plays in and games open to join.

use crate::store::{ShareId, ShareInfo};
use derive_getters::Getters;
use shared_tictactoe::{PlayerId, TicTacToeGame};
use std::fmt;

/// A game the user has joined.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct JoinedGame {
    /// Share holding the game.
    share_id: ShareId,
    /// Lobby line for the game.
    label: String,
    /// Whether the round is over.
    finished: bool,
    /// Whether the stored state could be loaded.
    usable: bool,
}

impl JoinedGame {
    /// Builds the lobby line from the share listing and the loaded game.
    pub fn new(share: &ShareInfo, game: Option<&TicTacToeGame>) -> Self {
        let finished = game.is_some_and(|g| g.status().is_finished());
        let label = if finished {
            "Game finished (click to see result)".to_string()
        } else {
            match share.users().as_slice() {
                [first, second, ..] => format!("{} vs {}", first, second),
                _ => "Waiting for player".to_string(),
            }
        };
        Self {
            share_id: share.id().clone(),
            label,
            finished,
            usable: true,
        }
    }

    /// Lobby line for a game whose stored state failed to load.
    pub fn unusable(share: &ShareInfo) -> Self {
        Self {
            share_id: share.id().clone(),
            label: "Game unavailable (stored state is corrupt)".to_string(),
            finished: false,
            usable: false,
        }
    }
}

/// A game another user opened.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct JoinableGame {
    /// Share holding the game.
    share_id: ShareId,
    /// Host of the game; this is the lobby line.
    owner: PlayerId,
}

impl From<&ShareInfo> for JoinableGame {
    fn from(share: &ShareInfo) -> Self {
        Self {
            share_id: share.id().clone(),
            owner: share.owner().clone(),
        }
    }
}

/// Snapshot of the lobby.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct Lobby {
    /// Games the user has joined.
    joined: Vec<JoinedGame>,
    /// Games open to join.
    joinable: Vec<JoinableGame>,
}

impl Lobby {
    /// Creates a lobby listing.
    pub fn new(joined: Vec<JoinedGame>, joinable: Vec<JoinableGame>) -> Self {
        Self { joined, joinable }
    }

    /// Renders the listing as text.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Lobby {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.joined.is_empty() {
            writeln!(f, "Playing:")?;
            for game in &self.joined {
                writeln!(f, "   {}", game.label)?;
            }
        }
        if self.joinable.is_empty() {
            writeln!(f, "No new games to join")
        } else {
            writeln!(f, "Games to join:")?;
            for game in &self.joinable {
                writeln!(f, "   {}", game.owner)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_tictactoe::Position;

    fn share(users: &[&str]) -> ShareInfo {
        ShareInfo::new(
            "share-0001".into(),
            users[0].into(),
            users.iter().map(|u| u.to_string()).collect(),
            users.len() < 2,
        )
    }

    #[test]
    fn test_labels() {
        let waiting = JoinedGame::new(&share(&["alice"]), None);
        assert_eq!(waiting.label(), "Waiting for player");

        let playing = JoinedGame::new(&share(&["alice", "bob"]), None);
        assert_eq!(playing.label(), "alice vs bob");
        assert!(!playing.finished());

        let mut game = TicTacToeGame::new("alice", "alice");
        game.forfeit().unwrap();
        game.update(None).unwrap();
        let done = JoinedGame::new(&share(&["alice", "bob"]), Some(&game));
        assert_eq!(done.label(), "Game finished (click to see result)");
        assert!(*done.finished());

        let mut live = TicTacToeGame::new("alice", "alice");
        live.do_move(Position::CENTER).unwrap();
        live.update(None).unwrap();
        assert!(!JoinedGame::new(&share(&["alice"]), Some(&live)).finished());

        let corrupt = JoinedGame::unusable(&share(&["alice", "bob"]));
        assert_eq!(corrupt.label(), "Game unavailable (stored state is corrupt)");
        assert!(!corrupt.usable());
        assert!(*playing.usable());
    }

    #[test]
    fn test_render() {
        let lobby = Lobby::new(
            vec![JoinedGame::new(&share(&["alice", "bob"]), None)],
            vec![JoinableGame::from(&share(&["carol"]))],
        );
        assert_eq!(
            lobby.render(),
            "Playing:\n   alice vs bob\nGames to join:\n   carol\n"
        );
        assert_eq!(Lobby::default().render(), "No new games to join\n");
    }

    #[test]
    fn test_display_matches_render() {
        let lobby = Lobby::new(
            vec![
                JoinedGame::new(&share(&["alice"]), None),
                JoinedGame::unusable(&share(&["alice", "bob"])),
            ],
            Vec::new(),
        );
        assert_eq!(
            format!("{lobby}"),
            "Playing:\n   Waiting for player\n   Game unavailable (stored state is corrupt)\nNo new games to join\n"
        );
        assert_eq!(lobby.render(), lobby.to_string());
    }
}
