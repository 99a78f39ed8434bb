//! Instant notifications between players.
//!
//! Notifications are a latency hint only. A lost notification means the
//! recipient sees the change on their next read.

use crate::store::ShareId;
use async_trait::async_trait;
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use shared_tictactoe::PlayerId;

/// Kind of notification.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum NotificationKey {
    /// A player joined the recipient's game.
    PlayerJoined,
    /// The sender moved; it is the recipient's turn.
    YourTurn,
    /// The sender forfeited.
    Forfeit,
}

/// A message pushed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new, Serialize, Deserialize)]
pub struct Notification {
    /// Kind of notification.
    key: NotificationKey,
    /// Share the notification refers to.
    share_id: ShareId,
    /// Human-readable text.
    text: String,
    /// User who sent it.
    sender: PlayerId,
    /// User it is addressed to.
    recipient: PlayerId,
}

/// Best-effort push channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends a notification. Delivery failures are not reported.
    async fn send_instant_notification(&self, notification: Notification);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_wire_names() {
        assert_eq!(NotificationKey::PlayerJoined.to_string(), "player-joined");
        assert_eq!(NotificationKey::YourTurn.to_string(), "your-turn");
        assert_eq!(
            serde_json::to_string(&NotificationKey::Forfeit).unwrap(),
            "\"forfeit\""
        );
    }
}
