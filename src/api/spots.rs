//! Parking spot endpoints
//!
//! - GET /api/spots - List spots, optionally filtered by status and EV charging
//! - GET /api/spots/{id} - Get a single spot

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, ApiQuery, AppState};
use crate::db::repositories::SpotFilter;
use crate::models::{ParkingSpot, SpotStatus};

/// Query parameters for listing spots
#[derive(Debug, Default, Deserialize)]
pub struct SpotListQuery {
    pub status: Option<String>,
    pub ev_charging: Option<bool>,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/spots", get(list_spots))
        .route("/spots/{id}", get(get_spot))
}

/// GET /api/spots
///
/// A status value no spot can have matches nothing.
async fn list_spots(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SpotListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => match raw.parse::<SpotStatus>() {
            Ok(status) => Some(status),
            Err(_) => return Ok(Json(Vec::<ParkingSpot>::new())),
        },
    };

    let spots = state
        .spot_service
        .list_spots(SpotFilter {
            status,
            ev_charging: query.ev_charging,
        })
        .await?;

    Ok(Json(spots))
}

/// GET /api/spots/{id}
async fn get_spot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let spot = state.spot_service.get_spot(&id).await?;
    Ok(Json(spot))
}
