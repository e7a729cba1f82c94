//! Registry of live notification channels per connected user.
//!
//! A user may hold any number of concurrent sessions (tabs, devices);
//! each session registers one channel. The registry is the single
//! process-wide instance behind notification fan-out: it is created at
//! startup, shared through `AppState`, and torn down with the process.

use std::collections::HashMap;
use std::fmt;

use tokio::sync::RwLock;
use tokio::sync::mpsc;

use super::{Notification, UserId};

/// Unique identifier for one live notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(uuid::Uuid);

impl ChannelId {
    /// Creates a new random channel id.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One live, addressable delivery path for push notifications.
///
/// The sender side of the session's unbounded channel; the receiving
/// half lives in the WebSocket connection loop.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    /// Identifier used to unregister this channel on disconnect.
    pub id: ChannelId,
    /// Fire-and-forget sender into the session's connection loop.
    pub sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelHandle {
    /// Creates a channel handle with a fresh id, returning the receiving
    /// half alongside it.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                id: ChannelId::new(),
                sender,
            },
            receiver,
        )
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    by_user: HashMap<UserId, HashMap<ChannelId, mpsc::UnboundedSender<Notification>>>,
    by_channel: HashMap<ChannelId, UserId>,
}

/// Maps user identities to their currently connected channels.
///
/// # Concurrency
///
/// Register/unregister/lookup run from independent connection lifecycles;
/// the inner maps are guarded by a [`tokio::sync::RwLock`] so every
/// concurrent registration is retained.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    inner: RwLock<RegistryInner>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handle` to the set of channels for `user`.
    ///
    /// A channel id already registered (under any user) is re-bound to
    /// `user`, so a repeated register on the same connection cannot leak
    /// a stale entry.
    pub async fn register(&self, user: UserId, handle: ChannelHandle) {
        let mut inner = self.inner.write().await;
        if let Some(previous) = inner.by_channel.insert(handle.id, user)
            && let Some(channels) = inner.by_user.get_mut(&previous)
        {
            channels.remove(&handle.id);
            if channels.is_empty() {
                inner.by_user.remove(&previous);
            }
        }
        inner
            .by_user
            .entry(user)
            .or_default()
            .insert(handle.id, handle.sender);
        tracing::debug!(%user, channel = %handle.id, "session registered");
    }

    /// Removes the channel from whichever user's set contains it.
    ///
    /// Idempotent: unregistering an unknown channel is a no-op. The user
    /// entry is dropped once its channel set empties.
    pub async fn unregister(&self, channel: ChannelId) {
        let mut inner = self.inner.write().await;
        let Some(user) = inner.by_channel.remove(&channel) else {
            return;
        };
        if let Some(channels) = inner.by_user.get_mut(&user) {
            channels.remove(&channel);
            if channels.is_empty() {
                inner.by_user.remove(&user);
            }
        }
        tracing::debug!(%user, %channel, "session unregistered");
    }

    /// Returns the senders currently registered for `user`.
    pub async fn senders_for(&self, user: UserId) -> Vec<(ChannelId, mpsc::UnboundedSender<Notification>)> {
        let inner = self.inner.read().await;
        inner
            .by_user
            .get(&user)
            .map(|channels| {
                channels
                    .iter()
                    .map(|(id, sender)| (*id, sender.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the number of registered channels across all users.
    pub async fn channel_count(&self) -> usize {
        self.inner.read().await.by_channel.len()
    }

    /// Returns the number of users with at least one registered channel.
    pub async fn user_count(&self) -> usize {
        self.inner.read().await.by_user.len()
    }
}
