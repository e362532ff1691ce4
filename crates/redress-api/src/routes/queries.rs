//! # Search & Dashboard API
//!
//! Read-only views over the grievances visible to the caller: admins see
//! every grievance, users only their own.
//!
//! - `GET /v1/grievances/page?page&size` — newest first, paged.
//! - `GET /v1/grievances/search?query=` — case-insensitive substring search.
//! - `GET /v1/grievances/filter?status&submitter_id&assignee_id` — exact-match filter.
//! - `GET /v1/grievances/summary` — per-status counts.
//! - `GET /v1/grievances/track/{id}` — look up a grievance by its id text.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use redress_core::{GrievanceStatus, PrincipalId, ValidationError};
use redress_lifecycle::{GrievanceFilter, Page, PageRequest, StatusSummary, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::extract_query;
use crate::routes::grievances::GrievanceResponse;
use crate::state::AppState;

// ── Query parameters ────────────────────────────────────────────────────────

/// Paging parameters. Out-of-range values are clamped.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Page index starting at 0 (default 0).
    pub page: Option<usize>,
    /// Items per page (default 10, max 100).
    pub size: Option<usize>,
}

/// Free-text search parameters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Matched against title, description and id. Blank returns everything visible.
    pub query: Option<String>,
}

/// Filter parameters. Blank values are treated as absent.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FilterParams {
    /// Status name, e.g. `in-progress`.
    pub status: Option<String>,
    pub submitter_id: Option<String>,
    pub assignee_id: Option<String>,
}

impl FilterParams {
    fn into_filter(self) -> Result<GrievanceFilter, ValidationError> {
        let status = non_blank(self.status)
            .map(|s| s.parse::<GrievanceStatus>())
            .transpose()?;
        let submitter_id = non_blank(self.submitter_id)
            .map(PrincipalId::new)
            .transpose()?;
        let assignee_id = non_blank(self.assignee_id)
            .map(PrincipalId::new)
            .transpose()?;
        Ok(GrievanceFilter {
            status,
            submitter_id,
            assignee_id,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ── Response DTOs ───────────────────────────────────────────────────────────

/// One page of grievances.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PageResponse {
    pub items: Vec<GrievanceResponse>,
    pub page: usize,
    pub size: usize,
    /// Number of grievances visible to the caller.
    pub total: usize,
    pub total_pages: usize,
}

impl From<Page<redress_core::Grievance>> for PageResponse {
    fn from(page: Page<redress_core::Grievance>) -> Self {
        Self {
            items: page.items.into_iter().map(GrievanceResponse::from).collect(),
            page: page.page,
            size: page.size,
            total: page.total,
            total_pages: page.total_pages,
        }
    }
}

/// Dashboard counts per status.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SummaryResponse {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub rejected: usize,
}

impl From<StatusSummary> for SummaryResponse {
    fn from(s: StatusSummary) -> Self {
        Self {
            total: s.total,
            pending: s.pending,
            in_progress: s.in_progress,
            resolved: s.resolved,
            rejected: s.rejected,
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────────────

/// Build the queries router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/grievances/page", get(page_grievances))
        .route("/v1/grievances/search", get(search_grievances))
        .route("/v1/grievances/filter", get(filter_grievances))
        .route("/v1/grievances/summary", get(summary))
        .route("/v1/grievances/track/{id}", get(track_grievance))
}

fn to_responses(grievances: Vec<redress_core::Grievance>) -> Vec<GrievanceResponse> {
    grievances.into_iter().map(GrievanceResponse::from).collect()
}

// ── Handlers ────────────────────────────────────────────────────────────────

/// GET /v1/grievances/page — Newest-first page of visible grievances.
#[utoipa::path(
    get,
    path = "/v1/grievances/page",
    params(PageParams),
    responses(
        (status = 200, description = "Page of grievances", body = PageResponse),
        (status = 400, description = "Malformed query string", body = crate::error::ErrorBody),
    ),
    tag = "queries"
)]
pub(crate) async fn page_grievances(
    State(state): State<AppState>,
    Caller(principal): Caller,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<PageResponse>, AppError> {
    let params = extract_query(params)?;
    let request = PageRequest::new(
        params.page.unwrap_or(0),
        params.size.unwrap_or(DEFAULT_PAGE_SIZE),
    );
    Ok(Json(state.queries.page(&principal, request).into()))
}

/// GET /v1/grievances/search — Case-insensitive substring search.
#[utoipa::path(
    get,
    path = "/v1/grievances/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching grievances in id order", body = Vec<GrievanceResponse>),
    ),
    tag = "queries"
)]
pub(crate) async fn search_grievances(
    State(state): State<AppState>,
    Caller(principal): Caller,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<GrievanceResponse>>, AppError> {
    let params = extract_query(params)?;
    let term = params.query.unwrap_or_default();
    Ok(Json(to_responses(state.queries.search(&principal, &term))))
}

/// GET /v1/grievances/filter — Exact-match filter.
#[utoipa::path(
    get,
    path = "/v1/grievances/filter",
    params(FilterParams),
    responses(
        (status = 200, description = "Matching grievances in id order", body = Vec<GrievanceResponse>),
        (status = 422, description = "Unknown status or blank id", body = crate::error::ErrorBody),
    ),
    tag = "queries"
)]
pub(crate) async fn filter_grievances(
    State(state): State<AppState>,
    Caller(principal): Caller,
    params: Result<Query<FilterParams>, QueryRejection>,
) -> Result<Json<Vec<GrievanceResponse>>, AppError> {
    let filter = extract_query(params)?.into_filter()?;
    Ok(Json(to_responses(state.queries.filter(&principal, &filter))))
}

/// GET /v1/grievances/summary — Per-status counts.
#[utoipa::path(
    get,
    path = "/v1/grievances/summary",
    responses(
        (status = 200, description = "Counts over visible grievances", body = SummaryResponse),
    ),
    tag = "queries"
)]
pub(crate) async fn summary(
    State(state): State<AppState>,
    Caller(principal): Caller,
) -> Json<SummaryResponse> {
    Json(state.queries.summary(&principal).into())
}

/// GET /v1/grievances/track/{id} — Track a grievance by id.
#[utoipa::path(
    get,
    path = "/v1/grievances/track/{id}",
    params(("id" = String, Path, description = "Grievance id, e.g. g1")),
    responses(
        (status = 200, description = "Grievance found", body = GrievanceResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "queries"
)]
pub(crate) async fn track_grievance(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
) -> Result<Json<GrievanceResponse>, AppError> {
    Ok(Json(state.queries.track(&principal, &id)?.into()))
}
