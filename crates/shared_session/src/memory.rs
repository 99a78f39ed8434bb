//! In-memory store and notifier.
//!
//! [`MemoryStore`] is the shared backend; each user talks to it through a
//! [`MemoryStoreClient`] that remembers the field versions it has seen,
//! which is what compare-and-set is checked against.

use crate::error::{StoreError, StoreErrorKind};
use crate::notify::{Notification, Notifier};
use crate::store::{AccessPolicy, ShareId, ShareInfo, SharedStore};
use async_trait::async_trait;
use shared_tictactoe::PlayerId;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, instrument, warn};

/// One stored field.
#[derive(Debug, Clone)]
struct Field {
    value: String,
    version: u64,
    writer: PlayerId,
    access: AccessPolicy,
}

#[derive(Debug)]
struct Share {
    owner: PlayerId,
    users: Vec<PlayerId>,
    joinable: bool,
    fields: HashMap<String, Field>,
}

impl Share {
    fn info(&self, id: &str) -> ShareInfo {
        ShareInfo::new(
            id.to_string(),
            self.owner.clone(),
            self.users.clone(),
            self.joinable,
        )
    }
}

#[derive(Debug, Default)]
struct Backend {
    next_id: u64,
    shares: BTreeMap<ShareId, Share>,
    pending_fault: Option<StoreErrorKind>,
}

impl Backend {
    fn take_fault(&mut self) -> Result<(), StoreError> {
        match self.pending_fault.take() {
            Some(kind) => {
                warn!(%kind, "Injected store fault");
                Err(StoreError::new(kind, "injected fault"))
            }
            None => Ok(()),
        }
    }

    fn share(&self, id: &str) -> Result<&Share, StoreError> {
        self.shares
            .get(id)
            .ok_or_else(|| StoreError::not_found(format!("share {} does not exist", id)))
    }

    fn share_mut(&mut self, id: &str) -> Result<&mut Share, StoreError> {
        self.shares
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(format!("share {} does not exist", id)))
    }
}

/// Shared in-memory backend.
///
/// Cloning yields another reference to the same backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    backend: Arc<Mutex<Backend>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory store");
        Self::default()
    }

    /// Returns a handle acting as `username`.
    #[instrument(skip(self, username), fields(username = %username.as_ref()))]
    pub fn client(&self, username: impl AsRef<str>) -> MemoryStoreClient {
        MemoryStoreClient {
            username: username.as_ref().to_string(),
            backend: Arc::clone(&self.backend),
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Makes the next store operation, from any client, fail with `kind`.
    #[instrument(skip(self))]
    pub async fn inject_fault(&self, kind: StoreErrorKind) {
        self.backend.lock().await.pending_fault = Some(kind);
    }

    /// Writes a field unconditionally, bypassing versions and access checks.
    ///
    /// Used to seed or corrupt state from outside any client.
    #[instrument(skip(self, value))]
    pub async fn force_set(&self, share: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let mut backend = self.backend.lock().await;
        let entry = backend.share_mut(share)?;
        let version = entry.fields.get(key).map_or(0, |f| f.version) + 1;
        let writer = entry.owner.clone();
        entry.fields.insert(
            key.to_string(),
            Field {
                value: value.to_string(),
                version,
                writer,
                access: AccessPolicy::PublicReadAndWrite,
            },
        );
        Ok(())
    }
}

/// Per-user handle on a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryStoreClient {
    username: PlayerId,
    backend: Arc<Mutex<Backend>>,
    seen: Mutex<HashMap<(ShareId, String), u64>>,
}

impl MemoryStoreClient {
    async fn remember(&self, share: &str, key: &str, version: u64) {
        self.seen
            .lock()
            .await
            .insert((share.to_string(), key.to_string()), version);
    }

    async fn last_seen(&self, share: &str, key: &str) -> u64 {
        self.seen
            .lock()
            .await
            .get(&(share.to_string(), key.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl SharedStore for MemoryStoreClient {
    fn username(&self) -> &str {
        &self.username
    }

    #[instrument(skip(self), fields(user = %self.username))]
    async fn create(&self) -> Result<ShareInfo, StoreError> {
        let mut backend = self.backend.lock().await;
        backend.take_fault()?;
        backend.next_id += 1;
        let id = format!("share-{:04}", backend.next_id);
        let share = Share {
            owner: self.username.clone(),
            users: vec![self.username.clone()],
            joinable: true,
            fields: HashMap::new(),
        };
        let info = share.info(&id);
        backend.shares.insert(id.clone(), share);
        info!(share = %id, "Created data share");
        Ok(info)
    }

    #[instrument(skip(self), fields(user = %self.username))]
    async fn find_joined(&self) -> Result<Vec<ShareInfo>, StoreError> {
        let mut backend = self.backend.lock().await;
        backend.take_fault()?;
        let found: Vec<_> = backend
            .shares
            .iter()
            .filter(|(_, share)| share.users.contains(&self.username))
            .map(|(id, share)| share.info(id))
            .collect();
        debug!(count = found.len(), "Found joined shares");
        Ok(found)
    }

    #[instrument(skip(self), fields(user = %self.username))]
    async fn find_joinable(&self) -> Result<Vec<ShareInfo>, StoreError> {
        let mut backend = self.backend.lock().await;
        backend.take_fault()?;
        let found: Vec<_> = backend
            .shares
            .iter()
            .filter(|(_, share)| share.joinable && !share.users.contains(&self.username))
            .map(|(id, share)| share.info(id))
            .collect();
        debug!(count = found.len(), "Found joinable shares");
        Ok(found)
    }

    #[instrument(skip(self), fields(user = %self.username))]
    async fn info(&self, share: &str) -> Result<ShareInfo, StoreError> {
        let mut backend = self.backend.lock().await;
        backend.take_fault()?;
        Ok(backend.share(share)?.info(share))
    }

    #[instrument(skip(self), fields(user = %self.username))]
    async fn get(&self, share: &str, key: &str) -> Result<Option<String>, StoreError> {
        let (value, version) = {
            let mut backend = self.backend.lock().await;
            backend.take_fault()?;
            match backend.share(share)?.fields.get(key) {
                Some(field) => {
                    if field.access == AccessPolicy::Private && field.writer != self.username {
                        warn!(share, key, "Read of private field refused");
                        return Err(StoreError::permission(format!(
                            "{} is private to {}",
                            key, field.writer
                        )));
                    }
                    (Some(field.value.clone()), field.version)
                }
                None => (None, 0),
            }
        };
        self.remember(share, key, version).await;
        debug!(share, key, version, found = value.is_some(), "Read field");
        Ok(value)
    }

    #[instrument(skip(self, value), fields(user = %self.username))]
    async fn compare_and_set(
        &self,
        share: &str,
        key: &str,
        value: &str,
        access: AccessPolicy,
    ) -> Result<(), StoreError> {
        let expected = self.last_seen(share, key).await;
        let version = {
            let mut backend = self.backend.lock().await;
            backend.take_fault()?;
            let entry = backend.share_mut(share)?;
            if !entry.users.contains(&self.username) {
                warn!(share, "Write by user who has not joined");
                return Err(StoreError::permission(format!(
                    "{} has not joined {}",
                    self.username, share
                )));
            }
            let current = entry.fields.get(key);
            let guarded = current.is_some_and(|f| {
                f.access != AccessPolicy::PublicReadAndWrite && f.writer != self.username
            });
            if guarded {
                warn!(share, key, "Write refused by access policy");
                return Err(StoreError::permission(format!(
                    "{} may not write {}",
                    self.username, key
                )));
            }
            let stored = current.map_or(0, |f| f.version);
            if stored != expected {
                info!(share, key, expected, stored, "Compare-and-set lost");
                return Err(StoreError::changed(format!(
                    "{} changed since version {}",
                    key, expected
                )));
            }
            let writer = current.map_or_else(|| self.username.clone(), |f| f.writer.clone());
            let version = stored + 1;
            entry.fields.insert(
                key.to_string(),
                Field {
                    value: value.to_string(),
                    version,
                    writer,
                    access,
                },
            );
            version
        };
        self.remember(share, key, version).await;
        debug!(share, key, version, "Compare-and-set succeeded");
        Ok(())
    }

    #[instrument(skip(self), fields(user = %self.username))]
    async fn join(&self, share: &str) -> Result<bool, StoreError> {
        let mut backend = self.backend.lock().await;
        backend.take_fault()?;
        let entry = backend.share_mut(share)?;
        if entry.users.contains(&self.username) {
            debug!(share, "Already joined");
            return Ok(true);
        }
        if !entry.joinable {
            info!(share, "Share is not joinable");
            return Ok(false);
        }
        entry.users.push(self.username.clone());
        info!(share, users = entry.users.len(), "Joined share");
        Ok(true)
    }

    #[instrument(skip(self), fields(user = %self.username))]
    async fn leave(&self, share: &str) -> Result<(), StoreError> {
        let mut backend = self.backend.lock().await;
        backend.take_fault()?;
        let entry = backend.share_mut(share)?;
        entry.users.retain(|u| *u != self.username);
        let empty = entry.users.is_empty();
        if empty {
            backend.shares.remove(share);
            info!(share, "Last user left, share removed");
        } else {
            info!(share, "Left share");
        }
        Ok(())
    }

    #[instrument(skip(self), fields(user = %self.username))]
    async fn set_joinable(&self, share: &str, joinable: bool) -> Result<(), StoreError> {
        let mut backend = self.backend.lock().await;
        backend.take_fault()?;
        let entry = backend.share_mut(share)?;
        if !entry.users.contains(&self.username) {
            return Err(StoreError::permission(format!(
                "{} has not joined {}",
                self.username, share
            )));
        }
        entry.joinable = joinable;
        debug!(share, joinable, "Updated joinable flag");
        Ok(())
    }
}

/// Notifier delivering over per-recipient unbounded channels.
///
/// Notifications for a recipient with no live subscription are dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    subscribers: Arc<Mutex<HashMap<PlayerId, mpsc::UnboundedSender<Notification>>>>,
}

impl MemoryNotifier {
    /// Creates a notifier with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `user`, replacing any earlier subscription.
    #[instrument(skip(self, user), fields(user = %user.as_ref()))]
    pub async fn subscribe(
        &self,
        user: impl AsRef<str>,
    ) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .await
            .insert(user.as_ref().to_string(), tx);
        debug!("Subscribed to notifications");
        rx
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    #[instrument(skip(self, notification), fields(key = %notification.key(), recipient = %notification.recipient()))]
    async fn send_instant_notification(&self, notification: Notification) {
        let subscribers = self.subscribers.lock().await;
        match subscribers.get(notification.recipient()) {
            Some(tx) => {
                if tx.send(notification).is_err() {
                    debug!("Recipient stopped listening, notification dropped");
                } else {
                    debug!("Notification delivered");
                }
            }
            None => debug!("No subscriber, notification dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationKey;

    #[tokio::test]
    async fn test_compare_and_set_requires_latest_read() {
        let store = MemoryStore::new();
        let alice = store.client("alice");
        let bob = store.client("bob");
        let share = alice.create().await.unwrap();
        assert!(bob.join(share.id()).await.unwrap());

        let policy = AccessPolicy::PublicReadAndWrite;
        alice
            .compare_and_set(share.id(), "k", "1", policy)
            .await
            .unwrap();

        // Bob never read the field.
        let err = bob
            .compare_and_set(share.id(), "k", "2", policy)
            .await
            .unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::Changed);

        assert_eq!(bob.get(share.id(), "k").await.unwrap().as_deref(), Some("1"));
        bob.compare_and_set(share.id(), "k", "2", policy)
            .await
            .unwrap();

        // Alice's last write is now stale.
        let err = alice
            .compare_and_set(share.id(), "k", "3", policy)
            .await
            .unwrap_err();
        assert!(err.is_changed());
    }

    #[tokio::test]
    async fn test_join_closed_share_returns_false() {
        let store = MemoryStore::new();
        let alice = store.client("alice");
        let share = alice.create().await.unwrap();
        alice.set_joinable(share.id(), false).await.unwrap();
        assert!(!store.client("bob").join(share.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_listings() {
        let store = MemoryStore::new();
        let alice = store.client("alice");
        let bob = store.client("bob");
        let share = alice.create().await.unwrap();

        assert_eq!(alice.find_joined().await.unwrap(), vec![share.clone()]);
        assert!(alice.find_joinable().await.unwrap().is_empty());
        assert_eq!(bob.find_joinable().await.unwrap(), vec![share.clone()]);
        assert!(bob.find_joined().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_last_leave_removes_share() {
        let store = MemoryStore::new();
        let alice = store.client("alice");
        let share = alice.create().await.unwrap();
        alice.leave(share.id()).await.unwrap();
        let err = alice.info(share.id()).await.unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_read_only_field_refuses_other_writers() {
        let store = MemoryStore::new();
        let alice = store.client("alice");
        let bob = store.client("bob");
        let share = alice.create().await.unwrap();
        bob.join(share.id()).await.unwrap();
        alice
            .compare_and_set(share.id(), "k", "a", AccessPolicy::PublicReadOnly)
            .await
            .unwrap();
        bob.get(share.id(), "k").await.unwrap();
        let err = bob
            .compare_and_set(share.id(), "k", "b", AccessPolicy::PublicReadAndWrite)
            .await
            .unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::Permission);
    }

    #[tokio::test]
    async fn test_injected_fault_hits_next_call_only() {
        let store = MemoryStore::new();
        let alice = store.client("alice");
        store.inject_fault(StoreErrorKind::Transport).await;
        assert_eq!(
            alice.create().await.unwrap_err().kind,
            StoreErrorKind::Transport
        );
        assert!(alice.create().await.is_ok());
    }

    #[tokio::test]
    async fn test_notifier_delivers_to_subscriber_only() {
        let notifier = MemoryNotifier::new();
        let mut bob_rx = notifier.subscribe("bob").await;
        let note = Notification::new(
            NotificationKey::YourTurn,
            "share-0001".into(),
            "It's your turn".into(),
            "alice".into(),
            "bob".into(),
        );
        notifier.send_instant_notification(note.clone()).await;
        // Nobody listens for carol; this must not fail.
        notifier
            .send_instant_notification(Notification::new(
                NotificationKey::Forfeit,
                "share-0001".into(),
                "gone".into(),
                "alice".into(),
                "carol".into(),
            ))
            .await;
        assert_eq!(bob_rx.recv().await, Some(note));
        assert!(bob_rx.try_recv().is_err());
    }
}
