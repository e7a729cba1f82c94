//! Gig-related DTOs for create, list, detail, and close operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::{PaginationMeta, default_page, default_per_page};
use crate::domain::{BidId, Gig, GigId, GigStatus, UserId};
use crate::service::GigDetail;

/// Request body for `POST /gigs`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGigRequest {
    /// Gig title (3–200 chars).
    pub title: String,
    /// Full description (10–5000 chars).
    pub description: String,
    /// Budget as a positive integer amount.
    pub budget: i64,
}

/// A gig as returned by every gig endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GigResponse {
    /// Unique gig identifier.
    pub id: GigId,
    /// Gig title.
    pub title: String,
    /// Full description.
    pub description: String,
    /// Owner's budget.
    pub budget: i64,
    /// Identity of the gig owner.
    pub owner_id: UserId,
    /// Lifecycle status.
    pub status: GigStatus,
    /// Winning bid, present once the gig is assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hired_bid_id: Option<BidId>,
    /// Winning bidder, present once the gig is assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hired_bidder_id: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Gig> for GigResponse {
    fn from(gig: Gig) -> Self {
        Self {
            id: gig.id,
            title: gig.title,
            description: gig.description,
            budget: gig.budget,
            owner_id: gig.owner_id,
            status: gig.status,
            hired_bid_id: gig.hired_bid_id,
            hired_bidder_id: gig.hired_bidder_id,
            created_at: gig.created_at,
            updated_at: gig.updated_at,
        }
    }
}

/// Query parameters for `GET /gigs`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct GigListParams {
    /// Case-insensitive title search term.
    #[serde(default)]
    pub search: Option<String>,
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl GigListParams {
    /// Clamps `page` and `per_page` to their allowed ranges.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            search: self.search.clone(),
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 100),
        }
    }
}

/// Paginated response for `GET /gigs`.
#[derive(Debug, Serialize, ToSchema)]
pub struct GigListResponse {
    /// Gigs on the current page.
    pub data: Vec<GigResponse>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Unpaginated gig collection for `GET /gigs/my`.
#[derive(Debug, Serialize, ToSchema)]
pub struct GigCollectionResponse {
    /// The caller's gigs, newest first.
    pub data: Vec<GigResponse>,
    /// Number of gigs returned.
    pub count: usize,
}

/// The leading competing bid surfaced on an open gig's detail view.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeadingBidDto {
    /// Identity of the bidder holding the lowest price.
    pub bidder_id: UserId,
    /// The lowest pending price.
    pub price: i64,
}

/// Response body for `GET /gigs/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct GigDetailResponse {
    /// The gig record.
    #[serde(flatten)]
    pub gig: GigResponse,
    /// Whether the requesting identity owns this gig.
    pub is_owner: bool,
    /// Lowest-priced pending bid while the gig is open; informational
    /// snapshot, omitted otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leading_bid: Option<LeadingBidDto>,
}

impl From<GigDetail> for GigDetailResponse {
    fn from(detail: GigDetail) -> Self {
        Self {
            gig: detail.gig.into(),
            is_owner: detail.is_owner,
            leading_bid: detail.leading_bid.map(|bid| LeadingBidDto {
                bidder_id: bid.bidder_id,
                price: bid.price,
            }),
        }
    }
}
