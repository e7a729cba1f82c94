//! Real-time notifications pushed to connected users.
//!
//! The engagement core emits exactly one event: [`Notification::BidHired`],
//! dispatched to the winning bidder after a hire commits. Delivery is
//! best-effort over whatever WebSocket sessions the user currently holds.

use serde::Serialize;

use super::{BidId, GigId};

/// An event pushed to a specific user's live sessions.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Notification {
    /// The user's bid was hired for a gig.
    BidHired {
        /// The gig that was assigned.
        gig_id: GigId,
        /// The gig's title, for display without a follow-up fetch.
        gig_title: String,
        /// The user's winning bid.
        bid_id: BidId,
    },
}

impl Notification {
    /// Returns the event name as a static string slice.
    #[must_use]
    pub const fn event_str(&self) -> &'static str {
        match self {
            Self::BidHired { .. } => "bid_hired",
        }
    }
}
