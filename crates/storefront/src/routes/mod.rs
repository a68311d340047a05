//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                 - Liveness check
//! GET  /health/ready                           - Readiness check (store ping)
//!
//! # Users (rate limited)
//! POST /api/users/register                     - Create account, returns token
//! POST /api/users/login                        - Password login, returns token
//!
//! # Profile (requires bearer token)
//! GET  /api/users/profile                      - Profile with billing addresses
//! PUT  /api/users/profile/billing              - Add billing address
//! PUT  /api/users/profile/billing/{key}        - Replace billing address
//! PUT  /api/users/profile/billing/{key}/default - Make address the default
//! ```
//!
//! `{key}` is either a zero-based position or an address id.

pub mod health;
pub mod profile;
pub mod users;

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::from_fn,
    routing::{get, post, put},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::config::StorefrontConfig;
use crate::middleware::{
    auth_rate_limiter, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Create the registration and login router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route_layer(auth_rate_limiter())
}

/// Create the authenticated profile router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show))
        .route("/billing", put(profile::add_billing))
        .route("/billing/{key}", put(profile::update_billing))
        .route("/billing/{key}/default", put(profile::set_default_billing))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/users", user_routes())
        .nest("/api/users/profile", profile_routes())
}

/// Build the application router with its middleware stack.
///
/// Sentry layers are added by the binary so tests can run without a client.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(state.config());

    routes()
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        account_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// CORS for browser clients. No configured origins means any origin.
fn cors_layer(config: &StorefrontConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
