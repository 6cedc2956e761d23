//! API middleware
//!
//! Contains:
//! - Application state shared by all handlers
//! - The JSON error type and the mapping from service errors
//! - Identity resolution (session cookie or bearer token) and the
//!   `require_auth` guard for protected routes
//! - Session cookie helpers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request, State,
    },
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::repositories::{
    SqlxBookingRepository, SqlxRewardRepository, SqlxSensorEventRepository,
    SqlxSessionRepository, SqlxSharedSpaceRepository, SqlxSpotRepository,
    SqlxTransactionRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::User;
use crate::services::{
    AccountService, AccountServiceError, AuthService, AuthServiceError, BookingError,
    BookingService, IdentityProvider, PaymentError, PaymentService, PredictionService,
    RandomSource, RewardService, RewardServiceError, SharedSpaceError, SharedSpaceService,
    SpotService, SpotServiceError,
};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session_token";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub auth_service: Arc<AuthService>,
    pub spot_service: Arc<SpotService>,
    pub booking_service: Arc<BookingService>,
    pub payment_service: Arc<PaymentService>,
    pub reward_service: Arc<RewardService>,
    pub account_service: Arc<AccountService>,
    pub shared_space_service: Arc<SharedSpaceService>,
    pub prediction_service: Arc<PredictionService>,
}

impl AppState {
    /// Wire every repository and service over one pool
    pub fn new(
        pool: DynDatabasePool,
        identity: Arc<dyn IdentityProvider>,
        random: Arc<dyn RandomSource>,
        session_days: i64,
    ) -> Self {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let spot_repo = SqlxSpotRepository::boxed(pool.clone());
        let booking_repo = SqlxBookingRepository::boxed(pool.clone());
        let transaction_repo = SqlxTransactionRepository::boxed(pool.clone());
        let reward_repo = SqlxRewardRepository::boxed(pool.clone());
        let shared_space_repo = SqlxSharedSpaceRepository::boxed(pool.clone());
        let event_repo = SqlxSensorEventRepository::boxed(pool.clone());

        let auth_service = Arc::new(
            AuthService::new(
                identity,
                user_repo.clone(),
                session_repo,
                reward_repo.clone(),
            )
            .with_session_expiration(session_days),
        );
        let reward_service = Arc::new(RewardService::new(reward_repo.clone(), user_repo.clone()));
        let spot_service = Arc::new(SpotService::new(
            spot_repo.clone(),
            event_repo,
            random.clone(),
        ));
        let booking_service = Arc::new(BookingService::new(
            booking_repo.clone(),
            spot_repo.clone(),
        ));
        let payment_service = Arc::new(PaymentService::new(
            booking_repo.clone(),
            transaction_repo.clone(),
            reward_service.clone(),
            random.clone(),
        ));
        let account_service = Arc::new(AccountService::new(
            user_repo,
            booking_repo,
            spot_repo,
            transaction_repo,
            reward_repo,
        ));
        let shared_space_service = Arc::new(SharedSpaceService::new(shared_space_repo));
        let prediction_service = Arc::new(PredictionService::new(random));

        Self {
            pool,
            auth_service,
            spot_service,
            booking_service,
            payment_service,
            reward_service,
            account_service,
            shared_space_service,
            prediction_service,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new("INVALID_STATE", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn auth_error(message: impl Into<String>) -> Self {
        Self::new("AUTH_ERROR", message)
    }

    pub fn auth_unavailable(message: impl Into<String>) -> Self {
        Self::new("AUTH_UNAVAILABLE", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" | "AUTH_ERROR" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "INVALID_STATE" | "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Internal errors are logged here and reported without their cause chain
fn internal(err: anyhow::Error) -> ApiError {
    tracing::error!("Internal error: {:#}", err);
    ApiError::internal_error("Internal server error")
}

impl From<AuthServiceError> for ApiError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::MissingSessionId => ApiError::auth_error("Missing session ID"),
            AuthServiceError::Rejected(_) => ApiError::auth_error("Invalid session"),
            AuthServiceError::Unavailable(msg) => {
                ApiError::auth_unavailable(format!("Auth error: {}", msg))
            }
            AuthServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound(msg) => ApiError::not_found(msg),
            BookingError::InvalidState(msg) => ApiError::invalid_state(msg),
            BookingError::ValidationError(msg) => ApiError::validation_error(msg),
            BookingError::InternalError(e) => internal(e),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotFound(msg) => ApiError::not_found(msg),
            PaymentError::InternalError(e) => internal(e),
        }
    }
}

impl From<RewardServiceError> for ApiError {
    fn from(err: RewardServiceError) -> Self {
        match err {
            RewardServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<SpotServiceError> for ApiError {
    fn from(err: SpotServiceError) -> Self {
        match err {
            SpotServiceError::NotFound(msg) => ApiError::not_found(msg),
            SpotServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<AccountServiceError> for ApiError {
    fn from(err: AccountServiceError) -> Self {
        match err {
            AccountServiceError::NotFound(msg) => ApiError::not_found(msg),
            AccountServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            AccountServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<SharedSpaceError> for ApiError {
    fn from(err: SharedSpaceError) -> Self {
        match err {
            SharedSpaceError::ValidationError(msg) => ApiError::validation_error(msg),
            SharedSpaceError::InternalError(e) => internal(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation_error(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation_error(rejection.body_text())
    }
}

// ============================================================================
// Extractors
// ============================================================================

/// JSON body whose parse failures are reported as `VALIDATION_ERROR`
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string whose parse failures are reported as `VALIDATION_ERROR`
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

// ============================================================================
// Identity
// ============================================================================

/// Who is making the request, resolved once per request
#[derive(Debug, Clone)]
pub enum Identity {
    /// A valid, unexpired session
    User(User),
    /// No credential was presented
    Anonymous,
    /// A credential was presented but is unknown, expired or orphaned
    Invalid,
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Extract the session token: cookie first, then `Authorization: Bearer`
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|s| s.split(';'))
        .filter_map(|c| c.trim().strip_prefix("session_token="))
        .find(|t| !t.is_empty())
        .map(str::to_string);

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    })
}

/// Identity resolution middleware, layered on the whole API
pub async fn resolve_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = match extract_session_token(request.headers()) {
        None => Identity::Anonymous,
        Some(token) => match state.auth_service.resolve_session(&token).await? {
            Some(user) => Identity::User(user),
            None => Identity::Invalid,
        },
    };

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Authentication guard for protected routes
pub async fn require_auth(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let user = match request.extensions().get::<Identity>() {
        Some(Identity::User(user)) => user.clone(),
        Some(Identity::Invalid) => return Err(ApiError::unauthorized("Invalid or expired session")),
        _ => return Err(ApiError::unauthorized("Not authenticated")),
    };

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))
    }
}

// ============================================================================
// Cookies
// ============================================================================

fn cookie_headers(cookie: &str) -> Result<HeaderMap, ApiError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|_| ApiError::internal_error("Invalid session token"))?;
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}

/// `Set-Cookie` header establishing the session for `max_age_secs`
pub fn session_cookie(token: &str, max_age_secs: i64) -> Result<HeaderMap, ApiError> {
    cookie_headers(&format!(
        "{}={}; Path=/; HttpOnly; Secure; SameSite=None; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    ))
}

/// `Set-Cookie` header removing the session
pub fn clear_session_cookie() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static(
            "session_token=; Path=/; HttpOnly; Secure; SameSite=None; Max-Age=0",
        ),
    );
    headers
}
