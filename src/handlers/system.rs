use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - Service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "GlobeTrek API",
            "version": version,
            "description": "Owner-scoped travel itineraries with sparse path patching",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "itineraries": "/itineraries/create, /itineraries/get/:uid, /itineraries/byUser/:uid, /itineraries/modify/:uid, /itineraries/delete/:uid, /itineraries/deleteByOwner/:uid (protected)",
                "days": "/itinerariesDays/add/:id, /itinerariesDays/delete/:id/days/:dayIndex (protected)",
            }
        }
    }))
}

/// GET /health - Liveness plus store connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.service.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "store unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "store_error": e.to_string()
                }
            })),
        ),
    }
}
