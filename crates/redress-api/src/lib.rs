//! # redress-api — HTTP Service for Grievance Management
//!
//! Exposes the lifecycle policy and query engine over HTTP. Handlers stay
//! thin: they authenticate the caller, delegate to `redress-lifecycle`, write
//! accepted mutations through to Postgres when configured, and map errors to
//! status codes.
//!
//! ## API Surface
//!
//! | Prefix | Module | Domain |
//! |--------|--------|--------|
//! | `/v1/grievances`, `/v1/grievances/{id}/*` | [`routes::grievances`] | Lifecycle |
//! | `/v1/grievances/{id}/comments` | [`routes::comments`] | Comments |
//! | `/v1/grievances/{page,search,filter,summary,track}` | [`routes::queries`] | Queries |
//! | `/openapi.json` | [`openapi`] | Documentation |
//! | `/metrics`, `/health/*` | this module | Operations |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```
//!
//! Operational endpoints are mounted outside the auth middleware so probes
//! and scrapers need no credentials.

pub mod auth;
pub mod bootstrap;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    // Authenticated API routes.
    let api = Router::new()
        .merge(routes::grievances::router())
        .merge(routes::comments::router())
        .merge(routes::queries::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state.clone());

    // Unauthenticated operational endpoints.
    let ops = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(middleware::metrics::render_metrics))
        .with_state(state);

    Router::new().merge(ops).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
