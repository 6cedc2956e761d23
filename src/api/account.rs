//! Account endpoints (authenticated)
//!
//! - GET /api/history - Bookings with their spot and transaction
//! - GET /api/wallet - Points balance and transactions
//! - GET /api/profile - Current profile
//! - PATCH /api/profile - Update profile fields

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

use crate::api::middleware::{ApiError, ApiJson, AppState, AuthenticatedUser};
use crate::api::responses::SuccessResponse;
use crate::models::UpdateProfileInput;

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/history", get(history))
        .route("/wallet", get(wallet))
        .route("/profile", get(get_profile).patch(update_profile))
}

async fn history(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state.account_service.get_history(&user.id).await?;
    Ok(Json(entries))
}

async fn wallet(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let wallet = state.account_service.get_wallet(&user.id).await?;
    Ok(Json(wallet))
}

async fn get_profile(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.account_service.get_profile(&user.id).await?;
    Ok(Json(profile))
}

async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(input): ApiJson<UpdateProfileInput>,
) -> Result<impl IntoResponse, ApiError> {
    state.account_service.update_profile(&user.id, input).await?;
    Ok(Json(SuccessResponse::ok()))
}
