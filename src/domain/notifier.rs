//! Best-effort notification dispatch to a user's live sessions.

use std::sync::Arc;

use super::session_registry::SessionRegistry;
use super::{Notification, UserId};

/// Pushes events to every channel currently registered for a user.
///
/// Delivery is fire-and-forget: there is no queueing, no retry, and no
/// acknowledgement wait. A push failure on one channel is logged and
/// never prevents delivery to the others, nor does it surface to the
/// operation that triggered the notification.
#[derive(Debug, Clone)]
pub struct Notifier {
    sessions: Arc<SessionRegistry>,
}

impl Notifier {
    /// Creates a notifier backed by the given session registry.
    #[must_use]
    pub fn new(sessions: Arc<SessionRegistry>) -> Self {
        Self { sessions }
    }

    /// Returns the underlying session registry.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Pushes `notification` to every channel registered for `user`.
    ///
    /// Returns the number of channels the event was handed to. No
    /// registered channels is a silent no-op.
    pub async fn notify(&self, user: UserId, notification: Notification) -> usize {
        let senders = self.sessions.senders_for(user).await;
        if senders.is_empty() {
            tracing::debug!(%user, event = notification.event_str(), "no live sessions, dropping notification");
            return 0;
        }

        let mut delivered = 0;
        for (channel, sender) in senders {
            if sender.send(notification.clone()).is_ok() {
                delivered += 1;
            } else {
                // Receiver already dropped: the connection is tearing down
                // and will unregister itself.
                tracing::warn!(%user, %channel, event = notification.event_str(), "notification channel closed");
            }
        }
        tracing::debug!(%user, event = notification.event_str(), delivered, "notification dispatched");
        delivered
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::session_registry::ChannelHandle;
    use crate::domain::{BidId, GigId};

    fn make_event() -> Notification {
        Notification::BidHired {
            gig_id: GigId::new(),
            gig_title: "Paint the fence".to_string(),
            bid_id: BidId::new(),
        }
    }

    #[tokio::test]
    async fn notify_without_sessions_is_noop() {
        let notifier = Notifier::new(Arc::new(SessionRegistry::new()));
        let delivered = notifier.notify(UserId::new(), make_event()).await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn every_session_of_the_user_receives_the_event() {
        let registry = Arc::new(SessionRegistry::new());
        let notifier = Notifier::new(Arc::clone(&registry));
        let user = UserId::new();

        let (h1, mut rx1) = ChannelHandle::new();
        let (h2, mut rx2) = ChannelHandle::new();
        registry.register(user, h1).await;
        registry.register(user, h2).await;

        let delivered = notifier.notify(user, make_event()).await;
        assert_eq!(delivered, 2);
        assert!(rx1.recv().await.is_some());
        assert!(rx2.recv().await.is_some());
    }

    #[tokio::test]
    async fn other_users_receive_nothing() {
        let registry = Arc::new(SessionRegistry::new());
        let notifier = Notifier::new(Arc::clone(&registry));
        let target = UserId::new();
        let bystander = UserId::new();

        let (h1, mut target_rx) = ChannelHandle::new();
        let (h2, mut bystander_rx) = ChannelHandle::new();
        registry.register(target, h1).await;
        registry.register(bystander, h2).await;

        notifier.notify(target, make_event()).await;

        assert!(target_rx.recv().await.is_some());
        assert!(bystander_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dropped_receiver_does_not_block_the_rest() {
        let registry = Arc::new(SessionRegistry::new());
        let notifier = Notifier::new(Arc::clone(&registry));
        let user = UserId::new();

        let (h1, rx1) = ChannelHandle::new();
        let (h2, mut rx2) = ChannelHandle::new();
        registry.register(user, h1).await;
        registry.register(user, h2).await;
        drop(rx1); // simulate a connection torn down mid-dispatch

        let delivered = notifier.notify(user, make_event()).await;
        assert_eq!(delivered, 1);
        assert!(rx2.recv().await.is_some());
    }
}
