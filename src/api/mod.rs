//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api`. Identity is resolved once per request by
//! [`middleware::resolve_identity`]; protected routers add
//! [`middleware::require_auth`] as a route layer.

pub mod account;
pub mod auth;
pub mod bookings;
pub mod middleware;
pub mod payments;
pub mod responses;
pub mod rewards;
pub mod shared_spaces;
pub mod simulation;
pub mod spots;


use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware as axum_middleware, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub use middleware::{ApiError, AppState, AuthenticatedUser, Identity};

/// Build the API router (mounted under `/api`)
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .merge(auth::public_router())
        .merge(spots::public_router())
        .merge(rewards::public_router())
        .merge(shared_spaces::public_router())
        .merge(simulation::public_router());

    let protected = Router::new()
        .merge(auth::protected_router())
        .merge(bookings::protected_router())
        .merge(payments::protected_router())
        .merge(rewards::protected_router())
        .merge(account::protected_router())
        .merge(shared_spaces::protected_router())
        .route_layer(axum_middleware::from_fn(middleware::require_auth));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(axum_middleware::from_fn_with_state(
            state,
            middleware::resolve_identity,
        ))
}

/// CORS with cookie credentials. `*` mirrors the request origin, since a
/// wildcard cannot be combined with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::COOKIE,
            HeaderName::from_static("x-session-id"),
        ])
        .allow_credentials(true)
}

/// Build the complete application router
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
