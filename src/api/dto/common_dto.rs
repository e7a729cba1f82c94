//! Shared DTO types used across multiple endpoints.

use serde::Serialize;
use utoipa::ToSchema;

/// Pagination metadata included in paginated list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u32,
    /// Total number of pages.
    pub total_pages: u32,
}

/// Default page number for list endpoints.
pub(crate) fn default_page() -> u32 {
    1
}

/// Default page size for list endpoints.
pub(crate) fn default_per_page() -> u32 {
    20
}
