//! Mock subsystems exposed over HTTP
//!
//! - POST /api/predict-availability - Availability forecast for a destination
//! - POST /api/simulate-iot - Random sensor transitions
//! - POST /api/seed-data - Reset the spot inventory

use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, ApiJson, AppState};
use crate::api::responses::MessageResponse;
use crate::services::PredictionRequest;

#[derive(Debug, Serialize, Deserialize)]
pub struct SeedResponse {
    pub message: String,
    pub spots_created: usize,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/predict-availability", post(predict_availability))
        .route("/simulate-iot", post(simulate_iot))
        .route("/seed-data", post(seed_data))
}

async fn predict_availability(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PredictionRequest>,
) -> impl IntoResponse {
    Json(state.prediction_service.predict_availability(&req))
}

async fn simulate_iot(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let changed = state.spot_service.simulate_iot_update().await?;
    Ok(Json(MessageResponse::new(format!(
        "IoT simulation updated ({} spots changed)",
        changed
    ))))
}

async fn seed_data(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let spots_created = state.spot_service.seed_data().await?;
    Ok(Json(SeedResponse {
        message: "Database seeded successfully".to_string(),
        spots_created,
    }))
}
