//! Bid record, status lifecycle, and field validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::gig::{AMOUNT_MAX, AMOUNT_MIN};
use super::{BidId, GigId, UserId};
use crate::error::MarketError;

/// Minimum length for a bid message.
pub const MESSAGE_MIN: usize = 10;
/// Maximum length for a bid message.
pub const MESSAGE_MAX: usize = 2000;

/// Lifecycle status of a bid.
///
/// `Pending` is the only non-terminal state. At most one bid per gig ever
/// reaches `Hired`; the moment one does, every other pending bid on the
/// gig becomes `Rejected` in the same atomic step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    /// Awaiting the gig owner's decision.
    Pending,
    /// The winning bid on an assigned gig.
    Hired,
    /// Lost the gig, or the gig was closed.
    Rejected,
}

impl BidStatus {
    /// Returns the status as the string stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Hired => "hired",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for BidStatus {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "hired" => Ok(Self::Hired),
            "rejected" => Ok(Self::Rejected),
            other => Err(MarketError::Internal(format!(
                "unknown bid status in store: {other}"
            ))),
        }
    }
}

/// A candidate's proposal against a gig, carrying price and message.
///
/// At most one bid may exist per `(gig_id, bidder_id)` pair; the store
/// enforces this with a uniqueness constraint at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bid {
    /// Unique identifier.
    pub id: BidId,
    /// The gig this bid targets.
    pub gig_id: GigId,
    /// Identity of the bidder.
    pub bidder_id: UserId,
    /// Proposal text (10–2000 chars).
    pub message: String,
    /// Offered price, a positive integer amount.
    pub price: i64,
    /// Lifecycle status.
    pub status: BidStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Bid {
    /// Creates a new pending bid by `bidder_id` on `gig_id`.
    ///
    /// Fields are taken as already validated; see [`validate_bid_fields`].
    #[must_use]
    pub fn new(gig_id: GigId, bidder_id: UserId, message: String, price: i64) -> Self {
        let now = Utc::now();
        Self {
            id: BidId::new(),
            gig_id,
            bidder_id,
            message,
            price,
            status: BidStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` if the bid is still awaiting a decision.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, BidStatus::Pending)
    }

    /// Returns `true` if `user` created this bid.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.bidder_id == user
    }
}

/// Validates and normalizes bid fields, shared by submit and revise.
///
/// Returns the trimmed message on success.
///
/// # Errors
///
/// Returns [`MarketError::Validation`] carrying one message per violated
/// field rule.
pub fn validate_bid_fields(message: &str, price: i64) -> Result<String, MarketError> {
    let message = message.trim();
    let mut errors = Vec::new();

    if message.is_empty() {
        errors.push("message is required".to_string());
    } else if message.chars().count() < MESSAGE_MIN {
        errors.push(format!("message must be at least {MESSAGE_MIN} characters"));
    } else if message.chars().count() > MESSAGE_MAX {
        errors.push(format!("message cannot exceed {MESSAGE_MAX} characters"));
    }

    if price < AMOUNT_MIN {
        errors.push(format!("price must be at least {AMOUNT_MIN}"));
    } else if price > AMOUNT_MAX {
        errors.push(format!("price cannot exceed {AMOUNT_MAX}"));
    }

    if errors.is_empty() {
        Ok(message.to_string())
    } else {
        Err(MarketError::Validation(errors))
    }
}
