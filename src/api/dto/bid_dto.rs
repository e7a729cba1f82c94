//! Bid-related DTOs for submit, revise, list, and hire operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::gig_dto::GigResponse;
use crate::domain::{Bid, BidId, BidStatus, Gig, GigId, GigStatus, UserId};

/// Request body for `POST /bids`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBidRequest {
    /// The gig to bid on.
    pub gig_id: GigId,
    /// Proposal text (10–2000 chars).
    pub message: String,
    /// Offered price as a positive integer amount.
    pub price: i64,
}

/// Request body for `PUT /bids/{id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBidRequest {
    /// Replacement proposal text.
    pub message: String,
    /// Replacement price.
    pub price: i64,
}

/// A bid as returned by every bid endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BidResponse {
    /// Unique bid identifier.
    pub id: BidId,
    /// The gig this bid targets.
    pub gig_id: GigId,
    /// Identity of the bidder.
    pub bidder_id: UserId,
    /// Proposal text.
    pub message: String,
    /// Offered price.
    pub price: i64,
    /// Lifecycle status.
    pub status: BidStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Bid> for BidResponse {
    fn from(bid: Bid) -> Self {
        Self {
            id: bid.id,
            gig_id: bid.gig_id,
            bidder_id: bid.bidder_id,
            message: bid.message,
            price: bid.price,
            status: bid.status,
            created_at: bid.created_at,
            updated_at: bid.updated_at,
        }
    }
}

/// Unpaginated bid collection for `GET /gigs/{id}/bids`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BidListResponse {
    /// Bids, newest first.
    pub data: Vec<BidResponse>,
    /// Number of bids returned.
    pub count: usize,
}

/// Summary of the gig a bid targets, for the caller's bid overview.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GigSummaryDto {
    /// Gig identifier.
    pub id: GigId,
    /// Gig title.
    pub title: String,
    /// Owner's budget.
    pub budget: i64,
    /// Gig lifecycle status.
    pub status: GigStatus,
}

impl From<Gig> for GigSummaryDto {
    fn from(gig: Gig) -> Self {
        Self {
            id: gig.id,
            title: gig.title,
            budget: gig.budget,
            status: gig.status,
        }
    }
}

/// One entry in the caller's bid overview: the bid plus its gig.
#[derive(Debug, Serialize, ToSchema)]
pub struct BidWithGigResponse {
    /// The bid.
    #[serde(flatten)]
    pub bid: BidResponse,
    /// Summary of the gig the bid targets.
    pub gig: GigSummaryDto,
}

/// Response body for `GET /bids/my`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MyBidsResponse {
    /// The caller's bids, newest first.
    pub data: Vec<BidWithGigResponse>,
    /// Number of bids returned.
    pub count: usize,
}

/// Response body for `PATCH /bids/{id}/hire`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HireResponse {
    /// The gig, now assigned.
    pub gig: GigResponse,
    /// The winning bid, now hired.
    pub bid: BidResponse,
}
