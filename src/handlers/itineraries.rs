use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::app::AppState;
use crate::auth::Principal;
use crate::itinerary::{parse_id, Itinerary, NewItinerary};
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct DeletedCount {
    pub deleted: u64,
}

/// POST /itineraries/create - Create an itinerary owned by the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Itinerary> {
    let Json(payload) = payload?;
    let fields = NewItinerary::from_json(payload)?;

    let itinerary = state.service.create(&principal, fields).await?;
    Ok(ApiResponse::created(itinerary))
}

/// GET /itineraries/get/:uid - Fetch one itinerary
pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(uid): Path<String>,
) -> ApiResult<Itinerary> {
    let id = parse_id(&uid)?;
    let itinerary = state.service.get(&principal, id).await?;
    Ok(ApiResponse::success(itinerary))
}

/// GET /itineraries/byUser/:uid - List every itinerary of a user, oldest first
pub async fn by_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(uid): Path<String>,
) -> ApiResult<Vec<Itinerary>> {
    let itineraries = state.service.list_by_owner(&principal, &uid).await?;
    Ok(ApiResponse::success(itineraries))
}

/// PATCH /itineraries/modify/:uid - Sparse update
///
/// The body is a flat map of top-level field names and dotted paths such as
/// `itinerary.0.description.2.checked`. All entries apply, or none do.
pub async fn modify(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(uid): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Itinerary> {
    let id = parse_id(&uid)?;
    let Json(payload) = payload?;

    let itinerary = state.service.patch_body(&principal, id, &payload).await?;
    Ok(ApiResponse::success(itinerary))
}

/// DELETE /itineraries/delete/:uid - Delete one itinerary; repeating it is harmless
pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(uid): Path<String>,
) -> ApiResult<()> {
    // An id that cannot parse cannot exist either
    let Ok(id) = parse_id(&uid) else {
        return Ok(ApiResponse::no_content());
    };

    state.service.delete(&principal, id).await?;
    Ok(ApiResponse::no_content())
}

/// DELETE /itineraries/deleteByOwner/:uid - Delete every itinerary of a user
pub async fn delete_by_owner(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(uid): Path<String>,
) -> ApiResult<DeletedCount> {
    let deleted = state.service.delete_by_owner(&principal, &uid).await?;
    Ok(ApiResponse::success(DeletedCount { deleted }))
}
