use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::AppConfig;
use crate::handlers::{days, itineraries, system};
use crate::middleware::bearer_auth_middleware;
use crate::services::ItineraryService;

/// Shared state handed to every handler and to the auth middleware
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ItineraryService>,
}

impl AppState {
    pub fn new(service: ItineraryService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        // Protected API
        .merge(itinerary_routes(state.clone()))
        .merge(day_routes(state.clone()))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn itinerary_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/itineraries/create", post(itineraries::create))
        .route("/itineraries/get/:uid", get(itineraries::get))
        .route("/itineraries/byUser/:uid", get(itineraries::by_user))
        .route("/itineraries/modify/:uid", patch(itineraries::modify))
        .route("/itineraries/delete/:uid", delete(itineraries::delete))
        .route("/itineraries/deleteByOwner/:uid", delete(itineraries::delete_by_owner))
        .route_layer(middleware::from_fn_with_state(state, bearer_auth_middleware))
}

fn day_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/itinerariesDays/add/:id", patch(days::add))
        .route("/itinerariesDays/delete/:id/days/:dayIndex", delete(days::remove))
        .route_layer(middleware::from_fn_with_state(state, bearer_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn router(ctx: &TestContext) -> Router {
        app(AppState::new(ctx.service.clone()), &AppConfig::development())
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let ctx = TestContext::new();
        let created = ctx.seed("u1", 1).await;

        let request = Request::get(format!("/itineraries/get/{}", created.id))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(router(&ctx), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn modify_then_get_through_the_router() {
        let ctx = TestContext::new();
        let created = ctx.seed("u1", 2).await;
        let token = ctx.token_for("u1");

        let request = Request::patch(format!("/itineraries/modify/{}", created.id))
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json")
            .body(Body::from(json!({ "itinerary.1.description.0.checked": "true" }).to_string()))
            .unwrap();
        let (status, body) = send(router(&ctx), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["itinerary"][1]["description"][0]["checked"], true);
        assert_eq!(body["data"]["itinerary"][0]["description"][0]["checked"], false);
    }

    #[tokio::test]
    async fn foreign_token_is_forbidden_and_missing_is_not_found() {
        let ctx = TestContext::new();
        let created = ctx.seed("u1", 1).await;
        let token = ctx.token_for("u2");

        let request = Request::delete(format!("/itinerariesDays/delete/{}/days/0", created.id))
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(router(&ctx), request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");

        let request = Request::get("/itineraries/get/not-a-uuid")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(router(&ctx), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn ownership_is_checked_before_body_shape() {
        let ctx = TestContext::new();
        let created = ctx.seed("u1", 1).await;

        for (token, status) in [
            (ctx.token_for("u2"), StatusCode::FORBIDDEN),
            (ctx.token_for("u1"), StatusCode::BAD_REQUEST),
        ] {
            let request = Request::patch(format!("/itinerariesDays/add/{}", created.id))
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(json!({ "description": [] }).to_string()))
                .unwrap();
            let (got, _) = send(router(&ctx), request).await;
            assert_eq!(got, status);

            let request = Request::patch(format!("/itineraries/modify/{}", created.id))
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from("[1, 2]"))
                .unwrap();
            let (got, _) = send(router(&ctx), request).await;
            assert_eq!(got, status);
        }
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let ctx = TestContext::new();
        let created = ctx.seed("u1", 1).await;
        let token = ctx.token_for("u1");

        let request = Request::patch(format!("/itineraries/modify/{}", created.id))
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(router(&ctx), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_JSON");
    }

    #[test]
    fn cors_layer_accepts_wildcard_and_skips_invalid_origins() {
        let _ = cors_layer(&["*".to_string()]);
        let _ = cors_layer(&["http://localhost:5173".to_string(), "not a header\n".to_string()]);
    }
}
