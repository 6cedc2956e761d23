//! Booking endpoints (authenticated)
//!
//! - POST /api/bookings - Reserve a spot
//! - GET /api/bookings - List the caller's bookings

use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, ApiJson, AppState, AuthenticatedUser};
use crate::models::CreateBookingInput;

pub fn protected_router() -> Router<AppState> {
    Router::new().route("/bookings", get(list_bookings).post(create_booking))
}

/// POST /api/bookings
async fn create_booking(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(input): ApiJson<CreateBookingInput>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state.booking_service.create_booking(&user.id, input).await?;
    Ok(Json(booking))
}

/// GET /api/bookings
async fn list_bookings(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let bookings = state.booking_service.list_bookings(&user.id).await?;
    Ok(Json(bookings))
}
