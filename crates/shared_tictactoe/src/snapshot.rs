//! The persisted game snapshot and its schema-checked codec.
//!
//! A snapshot is the whole persisted state of a match:
//!
//! ```json
//! { "moves": { "alice": [[0,0], "forfeit"] }, "firstMove": "alice" }
//! ```
//!
//! Everything else (board, turn, round end) is derived from it.

use super::action::MoveEntry;
use super::error::GameError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// Opaque player identity (username).
pub type PlayerId = String;

/// Per-player move sequences, keyed by identity.
pub type MoveLog = BTreeMap<PlayerId, Vec<MoveEntry>>;

/// The unit persisted under the `"game-state"` field of a data share.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    /// Move sequences of every player seen so far.
    pub moves: MoveLog,
    /// Player who took the first placement, if any.
    #[serde(rename = "firstMove", default)]
    pub first_move: Option<PlayerId>,
}

impl Snapshot {
    /// Decodes and validates a stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MalformedSnapshot`] if the JSON does not match
    /// the snapshot schema, if a coordinate is off the board, or if a player
    /// carries more than one forfeit marker.
    #[instrument(skip(raw), fields(len = raw.len()))]
    pub fn decode(raw: &str) -> Result<Self, GameError> {
        let snapshot: Snapshot = serde_json::from_str(raw).map_err(|e| {
            warn!(error = %e, "Rejected malformed snapshot");
            GameError::MalformedSnapshot(e.to_string())
        })?;
        snapshot.validate()?;
        debug!(players = snapshot.moves.len(), "Decoded snapshot");
        Ok(snapshot)
    }

    /// Encodes the snapshot in its canonical wire form.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Encode`] if serialization fails.
    pub fn encode(&self) -> Result<String, GameError> {
        serde_json::to_string(self).map_err(|e| GameError::Encode(e.to_string()))
    }

    /// Checks the constraints serde cannot express.
    fn validate(&self) -> Result<(), GameError> {
        for (player, entries) in &self.moves {
            if player.is_empty() {
                return Err(GameError::MalformedSnapshot(
                    "empty player identity".to_string(),
                ));
            }
            if entries.iter().filter(|e| e.is_forfeit()).count() > 1 {
                return Err(GameError::MalformedSnapshot(format!(
                    "player {:?} forfeited more than once",
                    player
                )));
            }
        }
        if matches!(&self.first_move, Some(first) if first.is_empty()) {
            return Err(GameError::MalformedSnapshot(
                "empty firstMove identity".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of placements (not counting forfeits) made by `player`.
    pub fn placements(&self, player: &str) -> usize {
        self.moves
            .get(player)
            .map(|entries| entries.iter().filter(|e| e.position().is_some()).count())
            .unwrap_or(0)
    }

    /// Total placements across all players.
    pub fn total_placements(&self) -> usize {
        self.moves
            .values()
            .flatten()
            .filter(|e| e.position().is_some())
            .count()
    }

    /// Returns true if `player` has a forfeit marker.
    pub fn has_forfeited(&self, player: &str) -> bool {
        self.moves
            .get(player)
            .is_some_and(|entries| entries.iter().any(MoveEntry::is_forfeit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    #[test]
    fn test_encode_matches_wire_format() {
        let mut snapshot = Snapshot::default();
        snapshot.moves.insert(
            "alice".to_string(),
            vec![MoveEntry::Place(Position::new(0, 0).unwrap())],
        );
        snapshot.first_move = Some("alice".to_string());
        assert_eq!(
            snapshot.encode().unwrap(),
            r#"{"moves":{"alice":[[0,0]]},"firstMove":"alice"}"#
        );
    }

    #[test]
    fn test_null_first_move_encoded() {
        assert_eq!(
            Snapshot::default().encode().unwrap(),
            r#"{"moves":{},"firstMove":null}"#
        );
    }

    #[test]
    fn test_missing_first_move_is_null() {
        let snapshot = Snapshot::decode(r#"{"moves":{"bob":[]}}"#).unwrap();
        assert_eq!(snapshot.first_move, None);
        assert!(snapshot.moves["bob"].is_empty());
    }

    #[test]
    fn test_malformed_shapes_rejected() {
        let cases = [
            "",
            "[]",
            r#"{"firstMove":null}"#,
            r#"{"moves":null,"firstMove":null}"#,
            r#"{"moves":{"alice":[0,0]},"firstMove":null}"#,
            r#"{"moves":{"alice":"forfeit"},"firstMove":null}"#,
            r#"{"moves":{"alice":[[0,3]]},"firstMove":null}"#,
            r#"{"moves":{"alice":[[0,0,1]]},"firstMove":null}"#,
            r#"{"moves":{"alice":["pass"]},"firstMove":null}"#,
            r#"{"moves":{},"firstMove":7}"#,
            r#"{"moves":{},"firstMove":null,"round":1}"#,
            r#"{"moves":{"alice":["forfeit","forfeit"]},"firstMove":null}"#,
            r#"{"moves":{"":[]},"firstMove":null}"#,
        ];
        for raw in cases {
            assert!(
                matches!(Snapshot::decode(raw), Err(GameError::MalformedSnapshot(_))),
                "accepted {raw}"
            );
        }
    }

    #[test]
    fn test_counts() {
        let snapshot = Snapshot::decode(
            r#"{"moves":{"alice":[[0,0],[1,1]],"bob":[[2,2],"forfeit"]},"firstMove":"alice"}"#,
        )
        .unwrap();
        assert_eq!(snapshot.placements("alice"), 2);
        assert_eq!(snapshot.placements("bob"), 1);
        assert_eq!(snapshot.placements("carol"), 0);
        assert_eq!(snapshot.total_placements(), 3);
        assert!(snapshot.has_forfeited("bob"));
        assert!(!snapshot.has_forfeited("alice"));
    }
}
