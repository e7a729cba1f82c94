//! Gateway error types with HTTP status code mapping.
//!
//! [`MarketError`] is the central error type for the service. Every
//! recoverable outcome of a marketplace operation (validation failure,
//! missing record, authorization failure, state conflict) is a variant
//! here; each maps to a numeric code and a structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{BidId, GigId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "validation failed",
///     "details": ["price must be at least 1"]
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`MarketError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Per-field messages for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                |
/// |-----------|-----------------|----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request            |
/// | 2000–2999 | Not Found       | 404 Not Found              |
/// | 3000–3999 | Authorization   | 401 / 403                  |
/// | 4000–4999 | State Conflict  | 409 Conflict               |
/// | 5000–5999 | Server          | 500 Internal Server Error  |
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// One or more request fields violated a validation rule.
    #[error("validation failed")]
    Validation(Vec<String>),

    /// Gig with the given ID was not found.
    #[error("gig not found: {0}")]
    GigNotFound(GigId),

    /// Bid with the given ID was not found.
    #[error("bid not found: {0}")]
    BidNotFound(BidId),

    /// The caller has no bid on the referenced gig.
    #[error("no bid found for gig {0}")]
    NoBidForGig(GigId),

    /// No verified caller identity was supplied with the request.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks the required relationship to the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A state precondition no longer holds, including the race-loser
    /// case on hire/close and the duplicate-bid uniqueness violation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persistence layer failure. The message is logged with full
    /// context; the client only sees a generic response.
    #[error("persistence error")]
    Persistence(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MarketError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::GigNotFound(_) => 2001,
            Self::BidNotFound(_) => 2002,
            Self::NoBidForGig(_) => 2003,
            Self::Unauthorized(_) => 3001,
            Self::Forbidden(_) => 3002,
            Self::Conflict(_) => 4001,
            Self::Internal(_) => 5000,
            Self::Persistence(_) => 5001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::GigNotFound(_) | Self::BidNotFound(_) | Self::NoBidForGig(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let details = match &self {
            Self::Validation(fields) => Some(fields.clone()),
            // Raw driver errors stay in the log, never in the response.
            Self::Persistence(detail) => {
                tracing::error!(%detail, "persistence failure");
                None
            }
            _ => None,
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
