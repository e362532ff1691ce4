//! # Grievance Lifecycle API
//!
//! - `POST /v1/grievances` — submit a grievance (users only).
//! - `GET /v1/grievances` — list grievances visible to the caller.
//! - `GET /v1/grievances/{id}` — fetch one grievance.
//! - `PUT /v1/grievances/{id}/status` — change status (admins only).
//! - `PUT /v1/grievances/{id}/assignee` — set or clear the assignee (admins only).
//!
//! Grievances the caller may not view are reported as not found.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use redress_core::{Comment, Grievance, PrincipalId, StatusChange};
use redress_lifecycle::SubmitGrievance;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::routes::{parse_grievance_id, persist_failed};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────────────

/// A grievance as returned by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GrievanceResponse {
    /// Grievance id, e.g. `g1`.
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    /// One of `pending`, `in-progress`, `resolved`, `rejected`.
    pub status: String,
    pub submitter_id: String,
    pub submitter_name: String,
    pub assignee_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub comments: Vec<CommentResponse>,
    pub status_history: Vec<StatusChangeResponse>,
}

impl From<Grievance> for GrievanceResponse {
    fn from(g: Grievance) -> Self {
        Self {
            id: g.id.to_string(),
            title: g.title,
            description: g.description,
            category: g.category,
            status: g.status.to_string(),
            submitter_id: g.submitter_id.to_string(),
            submitter_name: g.submitter_name,
            assignee_id: g.assignee_id.map(|a| a.to_string()),
            created_at: g.created_at,
            updated_at: g.updated_at,
            comments: g.comments.into_iter().map(CommentResponse::from).collect(),
            status_history: g
                .status_history
                .into_iter()
                .map(StatusChangeResponse::from)
                .collect(),
        }
    }
}

/// A comment on a grievance.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    /// Comment id, e.g. `c3`.
    pub id: String,
    pub text: String,
    pub author_id: String,
    pub author_name: String,
    /// Whether the author was an administrator when commenting.
    pub is_admin_comment: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id.to_string(),
            text: c.text,
            author_id: c.author_id.to_string(),
            author_name: c.author_name,
            is_admin_comment: c.is_admin_comment,
            created_at: c.created_at,
        }
    }
}

/// One recorded status change.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusChangeResponse {
    pub from: String,
    pub to: String,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
}

impl From<StatusChange> for StatusChangeResponse {
    fn from(c: StatusChange) -> Self {
        Self {
            from: c.from.to_string(),
            to: c.to.to_string(),
            changed_by: c.changed_by.to_string(),
            changed_at: c.changed_at,
        }
    }
}

/// Request to submit a new grievance.
///
/// Field rules are checked by the lifecycle policy after the role gate.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitGrievanceRequest {
    pub title: String,
    pub description: String,
    pub category: String,
}

/// Request to change a grievance's status.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeStatusRequest {
    /// Target status name, e.g. `in-progress`.
    pub status: String,
}

/// Request to set or clear the assignee. `null` clears it.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRequest {
    #[serde(default)]
    pub assignee_id: Option<String>,
}

impl Validate for AssignRequest {
    fn validate(&self) -> Result<(), String> {
        match &self.assignee_id {
            Some(id) if id.trim().is_empty() => {
                Err("assignee_id must not be blank; use null to unassign".to_string())
            }
            _ => Ok(()),
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────────────

/// Build the grievances router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/grievances", get(list_grievances).post(submit_grievance))
        .route("/v1/grievances/{id}", get(get_grievance))
        .route("/v1/grievances/{id}/status", put(change_status))
        .route("/v1/grievances/{id}/assignee", put(assign_grievance))
}

// ── Handlers ────────────────────────────────────────────────────────────────

/// POST /v1/grievances — Submit a grievance.
#[utoipa::path(
    post,
    path = "/v1/grievances",
    request_body = SubmitGrievanceRequest,
    responses(
        (status = 201, description = "Grievance submitted", body = GrievanceResponse),
        (status = 403, description = "Caller is not a user", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "grievances"
)]
pub(crate) async fn submit_grievance(
    State(state): State<AppState>,
    Caller(principal): Caller,
    body: Result<Json<SubmitGrievanceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GrievanceResponse>), AppError> {
    let req = extract_json(body)?;
    let grievance = state.policy.submit(
        &principal,
        &SubmitGrievance {
            title: req.title,
            description: req.description,
            category: req.category,
        },
    )?;

    if let Some(pool) = &state.db_pool {
        crate::db::grievances::insert(pool, &grievance)
            .await
            .map_err(|e| persist_failed(grievance.id, "grievance", e))?;
    }

    metrics::counter!("redress_grievances_submitted_total").increment(1);
    Ok((StatusCode::CREATED, Json(grievance.into())))
}

/// GET /v1/grievances — List grievances visible to the caller.
#[utoipa::path(
    get,
    path = "/v1/grievances",
    responses(
        (status = 200, description = "Visible grievances in id order", body = Vec<GrievanceResponse>),
    ),
    tag = "grievances"
)]
pub(crate) async fn list_grievances(
    State(state): State<AppState>,
    Caller(principal): Caller,
) -> Json<Vec<GrievanceResponse>> {
    Json(
        state
            .policy
            .list(&principal)
            .into_iter()
            .map(GrievanceResponse::from)
            .collect(),
    )
}

/// GET /v1/grievances/{id} — Fetch a grievance.
#[utoipa::path(
    get,
    path = "/v1/grievances/{id}",
    params(("id" = String, Path, description = "Grievance id, e.g. g1")),
    responses(
        (status = 200, description = "Grievance found", body = GrievanceResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "grievances"
)]
pub(crate) async fn get_grievance(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
) -> Result<Json<GrievanceResponse>, AppError> {
    let id = parse_grievance_id(&id)?;
    Ok(Json(state.policy.get(&principal, id)?.into()))
}

/// PUT /v1/grievances/{id}/status — Change a grievance's status.
#[utoipa::path(
    put,
    path = "/v1/grievances/{id}/status",
    params(("id" = String, Path, description = "Grievance id, e.g. g1")),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = GrievanceResponse),
        (status = 403, description = "Caller is not an admin", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Transition not allowed or concurrent change", body = crate::error::ErrorBody),
        (status = 422, description = "Unknown status", body = crate::error::ErrorBody),
    ),
    tag = "grievances"
)]
pub(crate) async fn change_status(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
    body: Result<Json<ChangeStatusRequest>, JsonRejection>,
) -> Result<Json<GrievanceResponse>, AppError> {
    let id = parse_grievance_id(&id)?;
    let req = extract_json(body)?;
    let grievance = state.policy.change_status(&principal, id, &req.status)?;

    if let Some(pool) = &state.db_pool {
        crate::db::grievances::update_lifecycle(pool, &grievance)
            .await
            .map_err(|e| persist_failed(id, "status change", e))?;
    }

    metrics::counter!(
        "redress_status_changes_total",
        "to" => grievance.status.as_str()
    )
    .increment(1);
    Ok(Json(grievance.into()))
}

/// PUT /v1/grievances/{id}/assignee — Set or clear the assignee.
#[utoipa::path(
    put,
    path = "/v1/grievances/{id}/assignee",
    params(("id" = String, Path, description = "Grievance id, e.g. g1")),
    request_body = AssignRequest,
    responses(
        (status = 200, description = "Assignee updated", body = GrievanceResponse),
        (status = 403, description = "Caller is not an admin", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "grievances"
)]
pub(crate) async fn assign_grievance(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
    body: Result<Json<AssignRequest>, JsonRejection>,
) -> Result<Json<GrievanceResponse>, AppError> {
    let id = parse_grievance_id(&id)?;
    let req = extract_validated_json(body)?;
    let assignee = req.assignee_id.map(PrincipalId::new).transpose()?;
    let grievance = state.policy.assign(&principal, id, assignee)?;

    if let Some(pool) = &state.db_pool {
        crate::db::grievances::update_lifecycle(pool, &grievance)
            .await
            .map_err(|e| persist_failed(id, "assignment", e))?;
    }

    Ok(Json(grievance.into()))
}
