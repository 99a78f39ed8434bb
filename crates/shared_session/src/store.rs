//! Shared store contract.
//!
//! A data share is a small record of keyed string fields that several
//! users can join. Writes use compare-and-set so that two players never
//! silently overwrite each other's moves.

use crate::error::StoreError;
use async_trait::async_trait;
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use shared_tictactoe::PlayerId;

/// Identifier of a data share.
pub type ShareId = String;

/// Listing information for one data share.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new, Serialize, Deserialize)]
pub struct ShareInfo {
    /// Share identifier.
    id: ShareId,
    /// User who created the share (the host).
    owner: PlayerId,
    /// Users currently joined, in join order.
    users: Vec<PlayerId>,
    /// Whether other users may join.
    joinable: bool,
}

impl ShareInfo {
    /// Returns true if `user` has joined this share.
    pub fn is_joined(&self, user: &str) -> bool {
        self.users.iter().any(|u| u == user)
    }
}

/// Who may read and write a field.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AccessPolicy {
    /// Every joined user may read and write.
    #[default]
    PublicReadAndWrite,
    /// Every joined user may read; only the first writer may write.
    PublicReadOnly,
    /// Only the first writer may read or write.
    Private,
}

/// Per-user handle on the shared store.
///
/// Every call may fail with a [`StoreError`]; a lost compare-and-set is
/// reported with kind [`Changed`](crate::StoreErrorKind::Changed).
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Identity of the user this handle acts for.
    fn username(&self) -> &str;

    /// Creates a joinable share owned by (and joined by) this user.
    async fn create(&self) -> Result<ShareInfo, StoreError>;

    /// Lists shares this user has joined.
    async fn find_joined(&self) -> Result<Vec<ShareInfo>, StoreError>;

    /// Lists joinable shares this user has not joined.
    async fn find_joinable(&self) -> Result<Vec<ShareInfo>, StoreError>;

    /// Current listing information for a share.
    async fn info(&self, share: &str) -> Result<ShareInfo, StoreError>;

    /// Reads a field. `None` if it was never written.
    async fn get(&self, share: &str, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a field if it is unchanged since this handle last read or wrote it.
    async fn compare_and_set(
        &self,
        share: &str,
        key: &str,
        value: &str,
        access: AccessPolicy,
    ) -> Result<(), StoreError>;

    /// Joins a share. Returns false if the share is no longer joinable.
    async fn join(&self, share: &str) -> Result<bool, StoreError>;

    /// Leaves a share.
    async fn leave(&self, share: &str) -> Result<(), StoreError>;

    /// Opens or closes a share to new users.
    async fn set_joinable(&self, share: &str, joinable: bool) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_access_policy_names() {
        assert_eq!(
            AccessPolicy::PublicReadAndWrite.to_string(),
            "public-read-and-write"
        );
        assert_eq!(
            AccessPolicy::from_str("private").unwrap(),
            AccessPolicy::Private
        );
    }

    #[test]
    fn test_is_joined() {
        let info = ShareInfo::new(
            "share-0001".into(),
            "alice".into(),
            vec!["alice".into()],
            true,
        );
        assert!(info.is_joined("alice"));
        assert!(!info.is_joined("bob"));
    }
}
