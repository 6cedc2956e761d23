//! Rewards endpoints
//!
//! - GET /api/rewards/me - The caller's ledger (authenticated)
//! - GET /api/rewards/leaderboard - Top users by points

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};

pub fn public_router() -> Router<AppState> {
    Router::new().route("/rewards/leaderboard", get(leaderboard))
}

pub fn protected_router() -> Router<AppState> {
    Router::new().route("/rewards/me", get(my_rewards))
}

async fn my_rewards(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let reward = state.reward_service.my_rewards(&user.id).await?;
    Ok(Json(reward))
}

async fn leaderboard(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let entries = state.reward_service.leaderboard().await?;
    Ok(Json(entries))
}
