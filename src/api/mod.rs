//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All endpoints are mounted under `/api/v1`.

pub mod dto;
pub mod handlers;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::IDENTITY_HEADER;
    use crate::domain::{Notifier, SessionRegistry, UserId};
    use crate::persistence::memory::MemoryStore;
    use crate::service::MarketService;

    fn test_app() -> Router {
        let sessions = Arc::new(SessionRegistry::new());
        let notifier = Notifier::new(Arc::clone(&sessions));
        let market_service = Arc::new(MarketService::new(Arc::new(MemoryStore::new()), notifier));
        build_router().with_state(AppState {
            market_service,
            sessions,
        })
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        identity: Option<UserId>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = identity {
            builder = builder.header(IDENTITY_HEADER, user.to_string());
        }
        let request = if let Some(json) = body {
            builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
        } else {
            builder.body(Body::empty())
        };
        let Ok(request) = request else {
            panic!("request construction failed");
        };
        let Ok(response) = app.clone().oneshot(request).await else {
            panic!("request failed");
        };
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn create_without_identity_is_unauthorized() {
        let app = test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/gigs",
            None,
            Some(serde_json::json!({
                "title": "Paint the fence",
                "description": "Two coats of white, back garden.",
                "budget": 500
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], 3001);
    }

    #[tokio::test]
    async fn validation_errors_carry_field_details() {
        let app = test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/gigs",
            Some(UserId::new()),
            Some(serde_json::json!({
                "title": "ab",
                "description": "too short",
                "budget": 0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 1001);
        let Some(details) = body["error"]["details"].as_array() else {
            panic!("expected details array");
        };
        assert_eq!(details.len(), 3);
    }

    #[tokio::test]
    async fn full_hire_flow_over_http() {
        let app = test_app();
        let owner = UserId::new();
        let bidder_one = UserId::new();
        let bidder_two = UserId::new();

        let (status, gig) = send(
            &app,
            "POST",
            "/api/v1/gigs",
            Some(owner),
            Some(serde_json::json!({
                "title": "Paint the fence",
                "description": "Two coats of white, back garden.",
                "budget": 500
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let gig_id = gig["id"].as_str().unwrap_or_default().to_string();

        let (status, bid_one) = send(
            &app,
            "POST",
            "/api/v1/bids",
            Some(bidder_one),
            Some(serde_json::json!({
                "gig_id": gig_id,
                "message": "I can start on Monday.",
                "price": 100
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/bids",
            Some(bidder_two),
            Some(serde_json::json!({
                "gig_id": gig_id,
                "message": "I will do it for less.",
                "price": 80
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        // detail view surfaces the cheapest pending bid to the owner
        let (status, detail) =
            send(&app, "GET", &format!("/api/v1/gigs/{gig_id}"), Some(owner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["is_owner"], true);
        assert_eq!(detail["leading_bid"]["price"], 80);

        let bid_one_id = bid_one["id"].as_str().unwrap_or_default().to_string();
        let (status, hired) = send(
            &app,
            "PATCH",
            &format!("/api/v1/bids/{bid_one_id}/hire"),
            Some(owner),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(hired["gig"]["status"], "assigned");
        assert_eq!(hired["bid"]["status"], "hired");

        // competing bid was rejected in the same step
        let (status, bids) = send(
            &app,
            "GET",
            &format!("/api/v1/gigs/{gig_id}/bids"),
            Some(owner),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bids["count"], 2);
        let Some(items) = bids["data"].as_array() else {
            panic!("expected bid array");
        };
        let statuses: Vec<&str> = items
            .iter()
            .filter_map(|b| b["status"].as_str())
            .collect();
        assert!(statuses.contains(&"hired"));
        assert!(statuses.contains(&"rejected"));

        // a second hire attempt is the race-loser outcome
        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/api/v1/bids/{bid_one_id}/hire"),
            Some(owner),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], 4001);
    }

    #[tokio::test]
    async fn non_owner_hire_is_forbidden() {
        let app = test_app();
        let owner = UserId::new();
        let bidder = UserId::new();

        let (_, gig) = send(
            &app,
            "POST",
            "/api/v1/gigs",
            Some(owner),
            Some(serde_json::json!({
                "title": "Paint the fence",
                "description": "Two coats of white, back garden.",
                "budget": 500
            })),
        )
        .await;
        let gig_id = gig["id"].as_str().unwrap_or_default().to_string();

        let (_, bid) = send(
            &app,
            "POST",
            "/api/v1/bids",
            Some(bidder),
            Some(serde_json::json!({
                "gig_id": gig_id,
                "message": "I can start on Monday.",
                "price": 100
            })),
        )
        .await;
        let bid_id = bid["id"].as_str().unwrap_or_default().to_string();

        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/api/v1/bids/{bid_id}/hire"),
            Some(UserId::new()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], 3002);
    }
}
