//! Data transfer objects for the REST API.

pub mod bid_dto;
pub mod common_dto;
pub mod gig_dto;

pub use bid_dto::{
    BidListResponse, BidResponse, BidWithGigResponse, CreateBidRequest, GigSummaryDto,
    HireResponse, MyBidsResponse, UpdateBidRequest,
};
pub use common_dto::PaginationMeta;
pub use gig_dto::{
    CreateGigRequest, GigCollectionResponse, GigDetailResponse, GigListParams, GigListResponse,
    GigResponse, LeadingBidDto,
};
