//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI document
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("{role}:{principal_id}:{display_name}:{secret}")
                        .description(Some("Shared-secret bearer token. Set via AUTH_TOKEN."))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI document for the whole API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Redress API",
        version = "0.1.0",
        description = "Grievance submission and triage.\n\nUsers submit grievances and follow their progress; administrators see every grievance, change its status, assign it and comment on it.\n\nAuthentication: `Authorization: Bearer {role}:{principal_id}:{display_name}:{secret}`. Health probes (`/health/*`) are unauthenticated.",
        license(name = "AGPL-3.0-or-later")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    paths(
        // ── Grievances ──────────────────────────────────────────────────
        crate::routes::grievances::submit_grievance,
        crate::routes::grievances::list_grievances,
        crate::routes::grievances::get_grievance,
        crate::routes::grievances::change_status,
        crate::routes::grievances::assign_grievance,
        // ── Comments ────────────────────────────────────────────────────
        crate::routes::comments::add_comment,
        crate::routes::comments::list_comments,
        // ── Queries ─────────────────────────────────────────────────────
        crate::routes::queries::page_grievances,
        crate::routes::queries::search_grievances,
        crate::routes::queries::filter_grievances,
        crate::routes::queries::summary,
        crate::routes::queries::track_grievance,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
            crate::routes::grievances::GrievanceResponse,
            crate::routes::grievances::CommentResponse,
            crate::routes::grievances::StatusChangeResponse,
            crate::routes::grievances::SubmitGrievanceRequest,
            crate::routes::grievances::ChangeStatusRequest,
            crate::routes::grievances::AssignRequest,
            crate::routes::comments::AddCommentRequest,
            crate::routes::queries::PageResponse,
            crate::routes::queries::SummaryResponse,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "grievances", description = "Submission, retrieval, status changes and assignment"),
        (name = "comments", description = "Append-only comment threads"),
        (name = "queries", description = "Search, filter, tracking, paging and dashboard counts"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
