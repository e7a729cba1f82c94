//! Domain layer: marketplace records, identifiers, and the live-session
//! notification machinery.
//!
//! This module contains the gig and bid records with their status
//! lifecycles and validation rules, the typed identifiers, the session
//! registry mapping users to connected channels, and the notifier that
//! fans events out to those channels.

pub mod bid;
pub mod gig;
pub mod ids;
pub mod notification;
pub mod notifier;
pub mod session_registry;

pub use bid::{Bid, BidStatus};
pub use gig::{Gig, GigStatus};
pub use ids::{BidId, GigId, UserId};
pub use notification::Notification;
pub use notifier::Notifier;
pub use session_registry::{ChannelHandle, ChannelId, SessionRegistry};
