//! Mock payment gateway endpoints (authenticated)
//!
//! - POST /api/payments/create-order
//! - POST /api/payments/verify

use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::Deserialize;

use crate::api::middleware::{ApiError, ApiJson, AppState, AuthenticatedUser};

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub booking_id: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_payment_id: String,
    pub razorpay_order_id: String,
    pub booking_id: String,
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/payments/create-order", post(create_order))
        .route("/payments/verify", post(verify_payment))
}

/// POST /api/payments/create-order
async fn create_order(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .payment_service
        .create_order(&user.id, &req.booking_id)
        .await?;
    Ok(Json(order))
}

/// POST /api/payments/verify
async fn verify_payment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(req): ApiJson<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state
        .payment_service
        .verify_payment(
            &user.id,
            &req.razorpay_order_id,
            &req.razorpay_payment_id,
            &req.booking_id,
        )
        .await?;
    Ok(Json(receipt))
}
