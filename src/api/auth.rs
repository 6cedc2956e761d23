//! Authentication API endpoints
//!
//! - POST /api/auth/session-data - Exchange an external session id for a session
//! - GET /api/auth/me - Get current user
//! - POST /api/auth/logout - End the current session

use axum::{
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{
    clear_session_cookie, extract_session_token, session_cookie, ApiError, AppState,
    AuthenticatedUser,
};
use crate::api::responses::MessageResponse;
use crate::services::identity::SESSION_ID_HEADER;

/// Build public auth router
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/session-data", post(session_data))
        .route("/auth/logout", post(logout))
}

/// Build protected auth router
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

/// POST /api/auth/session-data
///
/// Reads the external session id from `X-Session-ID`, returns
/// `{user, session_token}` and sets the session cookie.
async fn session_data(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = headers
        .get(SESSION_ID_HEADER)
        .and_then(|h| h.to_str().ok());

    let grant = state.auth_service.establish_session(session_id).await?;
    let cookie = session_cookie(
        &grant.session_token,
        state.auth_service.session_max_age_secs(),
    )?;

    Ok((cookie, Json(grant)))
}

/// GET /api/auth/me
async fn me(AuthenticatedUser(user): AuthenticatedUser) -> impl IntoResponse {
    Json(user)
}

/// POST /api/auth/logout
///
/// Succeeds whether or not a session was presented.
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = extract_session_token(&headers) {
        state.auth_service.logout(&token).await?;
    }

    Ok((clear_session_cookie(), Json(MessageResponse::new("Logged out"))))
}
