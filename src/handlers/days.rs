use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::auth::Principal;
use crate::itinerary::{parse_id, patch::parse_index, Itinerary};
use crate::middleware::{ApiResponse, ApiResult};

/// PATCH /itinerariesDays/add/:id - Append a day at the end of the sequence
///
/// Body: `{"day": "Day 3", "description": [{"place": .., "description": ..}]}`
pub async fn add(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Itinerary> {
    let id = parse_id(&id)?;
    let Json(payload) = payload?;

    let itinerary = state.service.append_day_body(&principal, id, payload).await?;
    Ok(ApiResponse::success(itinerary))
}

/// DELETE /itinerariesDays/delete/:id/days/:dayIndex - Remove the day at a position
///
/// Later days shift down by one.
pub async fn remove(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((id, day_index)): Path<(String, String)>,
) -> ApiResult<Itinerary> {
    let id = parse_id(&id)?;
    let index = parse_index("dayIndex", &day_index)?;

    let itinerary = state.service.remove_day(&principal, id, index).await?;
    Ok(ApiResponse::success(itinerary))
}
