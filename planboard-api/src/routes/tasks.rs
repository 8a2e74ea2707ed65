/// Task endpoints
///
/// - `PATCH /v1/tasks/:task_id` - Edit description and/or reassign
/// - `DELETE /v1/tasks/:task_id` - Delete with its comments
/// - `POST /v1/tasks/:task_id/comments` - Comment as the caller

use crate::{
    app::AppState,
    error::{ApiError, ApiJson, ApiResult},
    routes::caller_user_id,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use planboard_shared::{auth::middleware::AuthContext, models::Task};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub description: Option<String>,
    pub assignee_user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddCommentRequest {
    #[validate(length(min = 1, message = "Comment must not be empty"))]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddCommentResponse {
    pub comment_id: Uuid,
}

/// Applies the description edit first, then the reassignment
///
/// Each change is its own operation; a failed reassignment keeps an already
/// applied description edit.
pub async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let projects = &state.services.projects;

    let mut task = None;
    if let Some(description) = &req.description {
        task = Some(projects.edit_task_description(task_id, description).await?);
    }
    if let Some(assignee) = req.assignee_user_id {
        task = Some(projects.reassign_task(task_id, assignee).await?);
    }

    task.map(Json).ok_or_else(|| {
        ApiError::invalid(
            "description",
            "Provide a new description, a new assignee, or both",
        )
    })
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.projects.delete_task(task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    ApiJson(req): ApiJson<AddCommentRequest>,
) -> ApiResult<(StatusCode, Json<AddCommentResponse>)> {
    req.validate()?;

    let creator = caller_user_id(&state, &auth).await?;
    let comment_id = state
        .services
        .projects
        .add_comment(task_id, creator, &req.description)
        .await?;

    Ok((StatusCode::CREATED, Json(AddCommentResponse { comment_id })))
}
