/// Project tree endpoints
///
/// # Endpoints
///
/// - `GET /v1/projects` - Every project with its stages, tasks and comments
/// - `POST /v1/projects` - Create a project; the caller becomes creator and participant
/// - `PATCH /v1/projects/:project_id` - Rename and/or redescribe
/// - `DELETE /v1/projects/:project_id` - Delete with everything beneath it
/// - `GET|POST /v1/projects/:project_id/participants`
/// - `GET|POST /v1/projects/:project_id/stages`
/// - `GET|POST /v1/projects/:project_id/stages/:stage_id/tasks`
/// - `GET /v1/projects/:project_id/stages/:stage_id/tasks/:task_id/comments`

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
use planboard_shared::{
    auth::middleware::AuthContext,
    models::{Comment, ParticipantLink, Project, ProjectChanges, ProjectOutline, Stage, Task},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateProjectResponse {
    pub project_id: Uuid,
}

/// Partial update; at least one field is required
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LinkParticipantRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddStageRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddStageResponse {
    pub stage_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct AddTaskRequest {
    pub assignee_user_id: Uuid,

    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddTaskResponse {
    pub task_id: Uuid,
}

pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<Vec<ProjectOutline>>> {
    let projects = state.services.projects.list_projects().await?;
    Ok(Json(projects))
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<CreateProjectResponse>)> {
    req.validate()?;

    let creator = caller_user_id(&state, &auth).await?;
    let project_id = state
        .services
        .projects
        .create_project(creator, &req.name, &req.description)
        .await?;

    Ok((StatusCode::CREATED, Json(CreateProjectResponse { project_id })))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate()?;

    let changes = ProjectChanges {
        name: req.name,
        description: req.description,
    };
    if changes.is_empty() {
        return Err(ApiError::invalid(
            "name",
            "Provide a new name, a new description, or both",
        ));
    }

    let project = state
        .services
        .projects
        .update_project(project_id, changes)
        .await?;
    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.projects.delete_project(project_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_participants(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ParticipantLink>>> {
    let participants = state.services.projects.list_participants(project_id).await?;
    Ok(Json(participants))
}

pub async fn link_participant(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    ApiJson(req): ApiJson<LinkParticipantRequest>,
) -> ApiResult<(StatusCode, Json<ParticipantLink>)> {
    let link = state
        .services
        .projects
        .link_participant(project_id, req.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn list_stages(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Stage>>> {
    let stages = state.services.projects.list_stages(project_id).await?;
    Ok(Json(stages))
}

pub async fn add_stage(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    ApiJson(req): ApiJson<AddStageRequest>,
) -> ApiResult<(StatusCode, Json<AddStageResponse>)> {
    req.validate()?;

    let stage_id = state
        .services
        .projects
        .add_stage(project_id, &req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(AddStageResponse { stage_id })))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Path((project_id, stage_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state
        .services
        .projects
        .list_tasks(project_id, stage_id)
        .await?;
    Ok(Json(tasks))
}

/// Adds a task created by the caller
pub async fn add_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, stage_id)): Path<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<AddTaskRequest>,
) -> ApiResult<(StatusCode, Json<AddTaskResponse>)> {
    let creator = caller_user_id(&state, &auth).await?;
    let task_id = state
        .services
        .projects
        .add_task(
            project_id,
            stage_id,
            creator,
            req.assignee_user_id,
            &req.description,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(AddTaskResponse { task_id })))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path((project_id, stage_id, task_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<Json<Vec<Comment>>> {
    let comments = state
        .services
        .projects
        .list_comments(project_id, stage_id, task_id)
        .await?;
    Ok(Json(comments))
}
