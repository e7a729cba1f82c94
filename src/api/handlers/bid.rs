//! Bid handlers: submit, revise, overview, and the hire operation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};

use crate::api::dto::{
    BidResponse, BidWithGigResponse, CreateBidRequest, GigResponse, GigSummaryDto, HireResponse,
    MyBidsResponse, UpdateBidRequest,
};
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::domain::BidId;
use crate::error::{ErrorResponse, MarketError};

/// `POST /bids` — Submit a bid on a gig.
///
/// # Errors
///
/// Returns [`MarketError`] on validation failure, a missing gig, a
/// self-bid, a closed gig, or a duplicate bid.
#[utoipa::path(
    post,
    path = "/api/v1/bids",
    tag = "Bids",
    summary = "Submit a bid",
    description = "Creates a pending bid by the calling identity on an open gig. A bidder may hold at most one bid per gig, and owners may not bid on their own gigs.",
    request_body = CreateBidRequest,
    responses(
        (status = 201, description = "Bid created", body = BidResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 403, description = "Bid on own gig", body = ErrorResponse),
        (status = 404, description = "Gig not found", body = ErrorResponse),
        (status = 409, description = "Duplicate bid or gig not open", body = ErrorResponse),
    )
)]
pub async fn create_bid(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(req): Json<CreateBidRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let bid = state
        .market_service
        .submit_bid(req.gig_id, caller, &req.message, req.price)
        .await?;
    Ok((StatusCode::CREATED, Json(BidResponse::from(bid))))
}

/// `GET /bids/my` — Overview of the caller's bids across all gigs.
///
/// # Errors
///
/// Returns [`MarketError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/bids/my",
    tag = "Bids",
    summary = "List own bids",
    description = "Returns every bid the calling identity has placed, newest first, each with a summary of its gig.",
    responses(
        (status = 200, description = "The caller's bids", body = MyBidsResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
    )
)]
pub async fn my_bids(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<impl IntoResponse, MarketError> {
    let bids = state.market_service.bids_for_bidder(caller).await?;
    let data: Vec<BidWithGigResponse> = bids
        .into_iter()
        .map(|(bid, gig)| BidWithGigResponse {
            bid: BidResponse::from(bid),
            gig: GigSummaryDto::from(gig),
        })
        .collect();
    let count = data.len();
    Ok(Json(MyBidsResponse { data, count }))
}

/// `PUT /bids/{id}` — Revise the caller's pending bid.
///
/// # Errors
///
/// Returns [`MarketError`] on validation failure, a missing bid, a
/// foreign bid, or a bid/gig that left its mutable state.
#[utoipa::path(
    put,
    path = "/api/v1/bids/{id}",
    tag = "Bids",
    summary = "Revise a bid",
    description = "Replaces the message and price of the caller's own bid. Only possible while the bid is pending and its gig is still open.",
    params(
        ("id" = uuid::Uuid, Path, description = "Bid UUID"),
    ),
    request_body = UpdateBidRequest,
    responses(
        (status = 200, description = "Bid updated", body = BidResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 403, description = "Not the bid's creator", body = ErrorResponse),
        (status = 404, description = "Bid not found", body = ErrorResponse),
        (status = 409, description = "Bid or gig in a terminal state", body = ErrorResponse),
    )
)]
pub async fn update_bid(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdateBidRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let bid = state
        .market_service
        .revise_bid(BidId::from_uuid(id), caller, &req.message, req.price)
        .await?;
    Ok(Json(BidResponse::from(bid)))
}

/// `PATCH /bids/{id}/hire` — Hire the bidder behind a bid.
///
/// # Errors
///
/// Returns [`MarketError`] if a record is missing, the caller is not
/// the gig owner, or the gig/bid already left its open/pending state
/// (the expected answer for the loser of a hire race).
#[utoipa::path(
    patch,
    path = "/api/v1/bids/{id}/hire",
    tag = "Bids",
    summary = "Hire a bidder",
    description = "Assigns the bid's gig to this bid, marks the bid hired, and rejects all competing pending bids in one atomic step. Exactly one hire can ever succeed per gig; concurrent attempts receive a conflict. The hired bidder is notified over any live sessions after the transaction commits.",
    params(
        ("id" = uuid::Uuid, Path, description = "Bid UUID"),
    ),
    responses(
        (status = 200, description = "Bidder hired", body = HireResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 403, description = "Caller is not the gig owner", body = ErrorResponse),
        (status = 404, description = "Bid or gig not found", body = ErrorResponse),
        (status = 409, description = "Gig already decided or bid not pending", body = ErrorResponse),
    )
)]
pub async fn hire_bid(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let (gig, bid) = state
        .market_service
        .hire_bid(BidId::from_uuid(id), caller)
        .await?;
    Ok(Json(HireResponse {
        gig: GigResponse::from(gig),
        bid: BidResponse::from(bid),
    }))
}

/// Bid management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bids", post(create_bid))
        .route("/bids/my", get(my_bids))
        .route("/bids/{id}", put(update_bid))
        .route("/bids/{id}/hire", patch(hire_bid))
}
