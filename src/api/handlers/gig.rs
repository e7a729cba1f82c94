//! Gig handlers: create, list, detail, close, and bid views.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use crate::api::dto::{
    BidListResponse, BidResponse, CreateGigRequest, GigCollectionResponse, GigDetailResponse,
    GigListParams, GigListResponse, GigResponse, PaginationMeta,
};
use crate::app_state::AppState;
use crate::auth::{AuthUser, MaybeAuthUser};
use crate::domain::GigId;
use crate::error::{ErrorResponse, MarketError};

/// `POST /gigs` — Create a new gig.
///
/// # Errors
///
/// Returns [`MarketError`] on validation failure.
#[utoipa::path(
    post,
    path = "/api/v1/gigs",
    tag = "Gigs",
    summary = "Create a gig",
    description = "Creates an open gig owned by the calling identity. The owner is always the caller; it cannot be supplied in the body.",
    request_body = CreateGigRequest,
    responses(
        (status = 201, description = "Gig created", body = GigResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
    )
)]
pub async fn create_gig(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(req): Json<CreateGigRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let gig = state
        .market_service
        .create_gig(caller, &req.title, &req.description, req.budget)
        .await?;
    Ok((StatusCode::CREATED, Json(GigResponse::from(gig))))
}

/// `GET /gigs` — List open gigs with optional title search.
///
/// # Errors
///
/// Returns [`MarketError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/gigs",
    tag = "Gigs",
    summary = "List open gigs",
    description = "Returns a paginated list of gigs that are still accepting bids, newest first.",
    params(GigListParams),
    responses(
        (status = 200, description = "Paginated gig list", body = GigListResponse),
    )
)]
pub async fn list_gigs(
    State(state): State<AppState>,
    Query(params): Query<GigListParams>,
) -> Result<impl IntoResponse, MarketError> {
    let params = params.clamped();
    let gigs = state
        .market_service
        .list_open_gigs(params.search.as_deref())
        .await?;

    let total = gigs.len() as u32;
    let per_page = params.per_page;
    let page = params.page;
    let total_pages = if total == 0 {
        0
    } else {
        total.div_ceil(per_page)
    };

    let start = ((page - 1) * per_page) as usize;
    let data: Vec<GigResponse> = gigs
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .map(GigResponse::from)
        .collect();

    Ok(Json(GigListResponse {
        data,
        pagination: PaginationMeta {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// `GET /gigs/my` — List the caller's own gigs.
///
/// # Errors
///
/// Returns [`MarketError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/gigs/my",
    tag = "Gigs",
    summary = "List own gigs",
    description = "Returns every gig owned by the calling identity, newest first, regardless of status.",
    responses(
        (status = 200, description = "The caller's gigs", body = GigCollectionResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
    )
)]
pub async fn my_gigs(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<impl IntoResponse, MarketError> {
    let gigs = state.market_service.gigs_for_owner(caller).await?;
    let data: Vec<GigResponse> = gigs.into_iter().map(GigResponse::from).collect();
    let count = data.len();
    Ok(Json(GigCollectionResponse { data, count }))
}

/// `GET /gigs/{id}` — Get gig details.
///
/// # Errors
///
/// Returns [`MarketError::GigNotFound`] if the gig does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/gigs/{id}",
    tag = "Gigs",
    summary = "Get gig details",
    description = "Returns a single gig. While the gig is open the response carries the lowest-priced pending bid as an informational snapshot; an authenticated owner also gets `is_owner: true`.",
    params(
        ("id" = uuid::Uuid, Path, description = "Gig UUID"),
    ),
    responses(
        (status = 200, description = "Gig details", body = GigDetailResponse),
        (status = 404, description = "Gig not found", body = ErrorResponse),
    )
)]
pub async fn get_gig(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let detail = state
        .market_service
        .gig_detail(GigId::from_uuid(id), viewer)
        .await?;
    Ok(Json(GigDetailResponse::from(detail)))
}

/// `PATCH /gigs/{id}/close` — Close a gig without hiring.
///
/// # Errors
///
/// Returns [`MarketError`] if the gig is missing, the caller is not the
/// owner, or the gig is no longer open.
#[utoipa::path(
    patch,
    path = "/api/v1/gigs/{id}/close",
    tag = "Gigs",
    summary = "Close a gig",
    description = "Closes an open gig with no winner and rejects every pending bid on it, atomically. Owner only.",
    params(
        ("id" = uuid::Uuid, Path, description = "Gig UUID"),
    ),
    responses(
        (status = 200, description = "Gig closed", body = GigResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Gig not found", body = ErrorResponse),
        (status = 409, description = "Gig already assigned or closed", body = ErrorResponse),
    )
)]
pub async fn close_gig(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let gig = state
        .market_service
        .close_gig(GigId::from_uuid(id), caller)
        .await?;
    Ok(Json(GigResponse::from(gig)))
}

/// `GET /gigs/{id}/bids` — List bids on a gig. Owner only.
///
/// # Errors
///
/// Returns [`MarketError`] if the gig is missing or the caller is not
/// the owner.
#[utoipa::path(
    get,
    path = "/api/v1/gigs/{id}/bids",
    tag = "Gigs",
    summary = "List bids on a gig",
    description = "Returns every bid on the gig, newest first. Only the gig owner may call this.",
    params(
        ("id" = uuid::Uuid, Path, description = "Gig UUID"),
    ),
    responses(
        (status = 200, description = "Bids on the gig", body = BidListResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Gig not found", body = ErrorResponse),
    )
)]
pub async fn gig_bids(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let bids = state
        .market_service
        .bids_for_gig(GigId::from_uuid(id), caller)
        .await?;
    let data: Vec<BidResponse> = bids.into_iter().map(BidResponse::from).collect();
    let count = data.len();
    Ok(Json(BidListResponse { data, count }))
}

/// `GET /gigs/{id}/bids/mine` — Get the caller's own bid on a gig.
///
/// # Errors
///
/// Returns [`MarketError::NoBidForGig`] if the caller has no bid here.
#[utoipa::path(
    get,
    path = "/api/v1/gigs/{id}/bids/mine",
    tag = "Gigs",
    summary = "Get own bid on a gig",
    description = "Returns the bid the calling identity placed on this gig, if any.",
    params(
        ("id" = uuid::Uuid, Path, description = "Gig UUID"),
    ),
    responses(
        (status = 200, description = "The caller's bid", body = BidResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 404, description = "No bid by the caller on this gig", body = ErrorResponse),
    )
)]
pub async fn my_bid_for_gig(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let bid = state
        .market_service
        .my_bid(GigId::from_uuid(id), caller)
        .await?;
    Ok(Json(BidResponse::from(bid)))
}

/// Gig management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/gigs", post(create_gig).get(list_gigs))
        .route("/gigs/my", get(my_gigs))
        .route("/gigs/{id}", get(get_gig))
        .route("/gigs/{id}/close", patch(close_gig))
        .route("/gigs/{id}/bids", get(gig_bids))
        .route("/gigs/{id}/bids/mine", get(my_bid_for_gig))
}
