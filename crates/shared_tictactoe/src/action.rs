//! Entries of the per-player move log.
//!
//! Moves are domain events, not side effects. The log stores what each
//! player did; board and turn are derived from it.

use super::error::GameError;
use super::position::Position;
use serde::{Deserialize, Serialize};

/// Wire spelling of the forfeit marker.
pub const FORFEIT_MARKER: &str = "forfeit";

/// One entry in a player's move sequence.
///
/// Serialized as `[x, y]` for a placement and as the string `"forfeit"`
/// for a forfeit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawEntry", into = "RawEntry")]
pub enum MoveEntry {
    /// The player placed their piece at a position.
    Place(Position),
    /// The player gave up the round.
    Forfeit,
}

impl MoveEntry {
    /// Returns the position if this entry is a placement.
    pub fn position(&self) -> Option<Position> {
        match self {
            MoveEntry::Place(pos) => Some(*pos),
            MoveEntry::Forfeit => None,
        }
    }

    /// Returns true if this entry is the forfeit marker.
    pub fn is_forfeit(&self) -> bool {
        matches!(self, MoveEntry::Forfeit)
    }
}

impl std::fmt::Display for MoveEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveEntry::Place(pos) => write!(f, "{}", pos.label()),
            MoveEntry::Forfeit => write!(f, "{}", FORFEIT_MARKER),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Place(Position),
    Marker(String),
}

impl TryFrom<RawEntry> for MoveEntry {
    type Error = GameError;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        match raw {
            RawEntry::Place(pos) => Ok(MoveEntry::Place(pos)),
            RawEntry::Marker(marker) if marker == FORFEIT_MARKER => Ok(MoveEntry::Forfeit),
            RawEntry::Marker(marker) => Err(GameError::MalformedSnapshot(format!(
                "unknown move marker {:?}",
                marker
            ))),
        }
    }
}

impl From<MoveEntry> for RawEntry {
    fn from(entry: MoveEntry) -> Self {
        match entry {
            MoveEntry::Place(pos) => RawEntry::Place(pos),
            MoveEntry::Forfeit => RawEntry::Marker(FORFEIT_MARKER.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_wire_forms() {
        let place = MoveEntry::Place(Position::new(0, 2).unwrap());
        assert_eq!(serde_json::to_string(&place).unwrap(), "[0,2]");
        assert_eq!(
            serde_json::to_string(&MoveEntry::Forfeit).unwrap(),
            "\"forfeit\""
        );
    }

    #[test]
    fn test_decode_entries() {
        let entries: Vec<MoveEntry> = serde_json::from_str(r#"[[1,1],"forfeit"]"#).unwrap();
        assert_eq!(
            entries,
            vec![MoveEntry::Place(Position::CENTER), MoveEntry::Forfeit]
        );
    }

    #[test]
    fn test_unknown_marker_rejected() {
        assert!(serde_json::from_str::<MoveEntry>("\"resign\"").is_err());
        assert!(serde_json::from_str::<MoveEntry>("[4,0]").is_err());
        assert!(serde_json::from_str::<MoveEntry>("{}").is_err());
    }
}
