//! Trusted caller identity extraction.
//!
//! Identity resolution lives outside this service: an upstream auth
//! layer verifies the caller and injects the opaque user id in the
//! `x-user-id` header. The extractors here read that header without
//! re-verification; a protected route without the header is rejected
//! with 401.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::UserId;
use crate::error::MarketError;

/// Header carrying the verified caller identity, set by the upstream
/// auth proxy.
pub const IDENTITY_HEADER: &str = "x-user-id";

fn identity_from_parts(parts: &Parts) -> Option<UserId> {
    parts
        .headers
        .get(IDENTITY_HEADER)?
        .to_str()
        .ok()?
        .parse::<uuid::Uuid>()
        .ok()
        .map(UserId::from_uuid)
}

/// Extractor for routes that require a caller identity.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = MarketError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from_parts(parts).map(AuthUser).ok_or_else(|| {
            MarketError::Unauthorized("missing or malformed caller identity".to_string())
        })
    }
}

/// Extractor for public routes that personalize when an identity is
/// present (ownership flags on the gig detail view).
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<UserId>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(identity_from_parts(parts)))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let builder = Request::builder().uri("/");
        let builder = match value {
            Some(v) => builder.header(IDENTITY_HEADER, v),
            None => builder,
        };
        let Ok(request) = builder.body(()) else {
            panic!("request construction failed");
        };
        request.into_parts().0
    }

    #[test]
    fn valid_uuid_header_yields_identity() {
        let user = UserId::new();
        let parts = parts_with_header(Some(&user.to_string()));
        assert_eq!(identity_from_parts(&parts), Some(user));
    }

    #[test]
    fn missing_header_yields_none() {
        let parts = parts_with_header(None);
        assert_eq!(identity_from_parts(&parts), None);
    }

    #[test]
    fn malformed_header_yields_none() {
        let parts = parts_with_header(Some("not-a-uuid"));
        assert_eq!(identity_from_parts(&parts), None);
    }
}
