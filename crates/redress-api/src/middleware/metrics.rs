//! # Request Metrics
//!
//! HTTP-level counters recorded through the `metrics` facade. When the
//! binary installs a Prometheus recorder they are rendered at `/metrics`;
//! without a recorder the macros are no-ops.
//!
//! | Metric | Labels |
//! |--------|--------|
//! | `redress_http_requests_total` | `method`, `status` |
//! | `redress_http_errors_total` | `method`, `status` (4xx and 5xx only) |
//! | `redress_http_request_duration_seconds` | `method` |

use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::state::AppState;

/// Record request count, error count and latency for every request.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().as_str().to_owned();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let status_label = status.as_u16().to_string();
    metrics::counter!(
        "redress_http_requests_total",
        "method" => method.clone(),
        "status" => status_label.clone()
    )
    .increment(1);
    if status.is_client_error() || status.is_server_error() {
        metrics::counter!(
            "redress_http_errors_total",
            "method" => method.clone(),
            "status" => status_label
        )
        .increment(1);
    }
    metrics::histogram!("redress_http_request_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());

    response
}

/// GET /metrics — Prometheus text exposition.
///
/// Not found when no recorder handle was attached to the state.
pub async fn render_metrics(State(state): State<AppState>) -> Result<Response, AppError> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| AppError::NotFound("metrics recorder not installed".into()))?;
    Ok((
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response())
}
