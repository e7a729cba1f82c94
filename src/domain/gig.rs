//! Gig record, status lifecycle, and field validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BidId, GigId, UserId};
use crate::error::MarketError;

/// Minimum length for a gig title.
pub const TITLE_MIN: usize = 3;
/// Maximum length for a gig title.
pub const TITLE_MAX: usize = 200;
/// Minimum length for a gig description.
pub const DESCRIPTION_MIN: usize = 10;
/// Maximum length for a gig description.
pub const DESCRIPTION_MAX: usize = 5000;
/// Smallest allowed budget or price.
pub const AMOUNT_MIN: i64 = 1;
/// Largest allowed budget or price.
pub const AMOUNT_MAX: i64 = 1_000_000;

/// Lifecycle status of a gig.
///
/// `Open` is the only non-terminal state: a gig transitions to
/// `Assigned` exactly once (via hire) or to `Closed` (owner-initiated,
/// no winner), and never leaves either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GigStatus {
    /// Accepting bids.
    Open,
    /// A bid was hired; the gig has a winner.
    Assigned,
    /// Closed by the owner without hiring.
    Closed,
}

impl GigStatus {
    /// Returns the status as the string stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Assigned => "assigned",
            Self::Closed => "closed",
        }
    }
}

impl std::str::FromStr for GigStatus {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "assigned" => Ok(Self::Assigned),
            "closed" => Ok(Self::Closed),
            other => Err(MarketError::Internal(format!(
                "unknown gig status in store: {other}"
            ))),
        }
    }
}

/// A task advertised by an owner, open for competing bids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gig {
    /// Unique identifier.
    pub id: GigId,
    /// Short title (3–200 chars).
    pub title: String,
    /// Full description (10–5000 chars).
    pub description: String,
    /// Owner's budget, a positive integer amount.
    pub budget: i64,
    /// Identity of the gig owner.
    pub owner_id: UserId,
    /// Lifecycle status.
    pub status: GigStatus,
    /// Winning bid, present iff `status` is [`GigStatus::Assigned`].
    pub hired_bid_id: Option<BidId>,
    /// Winning bidder, present iff `status` is [`GigStatus::Assigned`].
    pub hired_bidder_id: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Gig {
    /// Creates a new open gig owned by `owner_id`.
    ///
    /// Fields are taken as already validated; see [`validate_gig_fields`].
    #[must_use]
    pub fn new(owner_id: UserId, title: String, description: String, budget: i64) -> Self {
        let now = Utc::now();
        Self {
            id: GigId::new(),
            title,
            description,
            budget,
            owner_id,
            status: GigStatus::Open,
            hired_bid_id: None,
            hired_bidder_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` if the gig is still accepting bids.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.status, GigStatus::Open)
    }

    /// Returns `true` if `user` owns this gig.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }
}

/// Validates and normalizes gig creation fields.
///
/// Returns the trimmed `(title, description)` on success.
///
/// # Errors
///
/// Returns [`MarketError::Validation`] carrying one message per violated
/// field rule.
pub fn validate_gig_fields(
    title: &str,
    description: &str,
    budget: i64,
) -> Result<(String, String), MarketError> {
    let title = title.trim();
    let description = description.trim();
    let mut errors = Vec::new();

    if title.is_empty() {
        errors.push("title is required".to_string());
    } else if title.chars().count() < TITLE_MIN {
        errors.push(format!("title must be at least {TITLE_MIN} characters"));
    } else if title.chars().count() > TITLE_MAX {
        errors.push(format!("title cannot exceed {TITLE_MAX} characters"));
    }

    if description.is_empty() {
        errors.push("description is required".to_string());
    } else if description.chars().count() < DESCRIPTION_MIN {
        errors.push(format!(
            "description must be at least {DESCRIPTION_MIN} characters"
        ));
    } else if description.chars().count() > DESCRIPTION_MAX {
        errors.push(format!(
            "description cannot exceed {DESCRIPTION_MAX} characters"
        ));
    }

    if budget < AMOUNT_MIN {
        errors.push(format!("budget must be at least {AMOUNT_MIN}"));
    } else if budget > AMOUNT_MAX {
        errors.push(format!("budget cannot exceed {AMOUNT_MAX}"));
    }

    if errors.is_empty() {
        Ok((title.to_string(), description.to_string()))
    } else {
        Err(MarketError::Validation(errors))
    }
}
