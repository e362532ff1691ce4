//! # Comment Thread API
//!
//! - `POST /v1/grievances/{id}/comments` — append a comment (admin or owner).
//! - `GET /v1/grievances/{id}/comments` — the thread in append order.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::routes::grievances::CommentResponse;
use crate::routes::{parse_grievance_id, persist_failed};
use crate::state::AppState;

/// Request to add a comment.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCommentRequest {
    pub text: String,
}

/// Build the comments router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/v1/grievances/{id}/comments",
        get(list_comments).post(add_comment),
    )
}

/// POST /v1/grievances/{id}/comments — Add a comment.
#[utoipa::path(
    post,
    path = "/v1/grievances/{id}/comments",
    params(("id" = String, Path, description = "Grievance id, e.g. g1")),
    request_body = AddCommentRequest,
    responses(
        (status = 201, description = "Comment added", body = CommentResponse),
        (status = 403, description = "Caller may not comment on this grievance", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "comments"
)]
pub(crate) async fn add_comment(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
    body: Result<Json<AddCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let id = parse_grievance_id(&id)?;
    let req = extract_json(body)?;
    let comment = state.policy.add_comment(&principal, id, &req.text)?;

    if let Some(pool) = &state.db_pool {
        crate::db::grievances::insert_comment(pool, id, &comment)
            .await
            .map_err(|e| persist_failed(id, "comment", e))?;
    }

    Ok((StatusCode::CREATED, Json(comment.into())))
}

/// GET /v1/grievances/{id}/comments — List a grievance's comments.
#[utoipa::path(
    get,
    path = "/v1/grievances/{id}/comments",
    params(("id" = String, Path, description = "Grievance id, e.g. g1")),
    responses(
        (status = 200, description = "Comments in append order", body = Vec<CommentResponse>),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "comments"
)]
pub(crate) async fn list_comments(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
) -> Result<Json<Vec<CommentResponse>>, AppError> {
    let id = parse_grievance_id(&id)?;
    let comments = state.policy.comments(&principal, id)?;
    Ok(Json(comments.into_iter().map(CommentResponse::from).collect()))
}
