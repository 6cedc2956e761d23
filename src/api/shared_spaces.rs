//! Peer-to-peer shared space endpoints
//!
//! - GET /api/shared-spaces - Available spaces
//! - POST /api/shared-spaces - List a new space (authenticated)

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, ApiJson, AppState, AuthenticatedUser};
use crate::models::CreateSharedSpaceInput;

pub fn public_router() -> Router<AppState> {
    Router::new().route("/shared-spaces", get(list_shared_spaces))
}

pub fn protected_router() -> Router<AppState> {
    Router::new().route("/shared-spaces", post(create_shared_space))
}

async fn list_shared_spaces(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let spaces = state.shared_space_service.list_shared_spaces().await?;
    Ok(Json(spaces))
}

async fn create_shared_space(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(input): ApiJson<CreateSharedSpaceInput>,
) -> Result<impl IntoResponse, ApiError> {
    let space = state
        .shared_space_service
        .create_shared_space(&user.id, input)
        .await?;
    Ok(Json(space))
}
