/// Comment endpoints
///
/// - `PATCH /v1/comments/:comment_id` - Replace the text
/// - `DELETE /v1/comments/:comment_id`

use crate::{
    app::AppState,
    error::{ApiJson, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use planboard_shared::models::Comment;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct EditCommentRequest {
    #[validate(length(min = 1, message = "Comment must not be empty"))]
    pub description: String,
}

pub async fn edit_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    ApiJson(req): ApiJson<EditCommentRequest>,
) -> ApiResult<Json<Comment>> {
    req.validate()?;

    let comment = state
        .services
        .projects
        .edit_comment(comment_id, &req.description)
        .await?;
    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.projects.delete_comment(comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
