/// User profile endpoints
///
/// # Endpoints
///
/// - `POST /v1/users` - Link a profile to a registered credential (public)
/// - `GET /v1/users/:user_id` - Profile with username and email
/// - `GET /v1/users/by-email/:email` - Resolve an email to a user ID
/// - `PUT /v1/users/:user_id/password` - Change the caller's own password
/// - `GET /v1/users/:user_id/projects` - Projects the user participates in
/// - `GET /v1/users/:user_id/projects/created` - Projects the user created

use crate::{
    app::AppState,
    error::{ApiError, ApiJson, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use planboard_shared::{
    auth::middleware::AuthContext,
    models::{ParticipantProject, ProfileFields, ProfileView, Project},
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

/// Create profile request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProfileRequest {
    /// Credential returned by registration
    pub credential_id: Uuid,

    #[validate(length(max = 150, message = "Display name must be at most 150 characters"))]
    #[serde(default)]
    pub display_name: String,

    #[validate(length(max = 300, message = "Full name must be at most 300 characters"))]
    #[serde(default)]
    pub full_name: String,

    pub birth_date: Option<NaiveDate>,

    pub avatar_ref: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserIdResponse {
    pub user_id: Uuid,
}

/// Change password request
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,

    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,

    /// Must match the email on file
    pub email: String,
}

/// Links a profile to a credential
///
/// Public: a fresh credential has no profile yet and so cannot log in.
///
/// # Errors
///
/// - `409 Conflict`: The credential already has a profile, or does not exist
pub async fn create_profile(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateProfileRequest>,
) -> ApiResult<(StatusCode, Json<UserIdResponse>)> {
    req.validate()?;

    let user_id = state
        .services
        .directory
        .create_profile(
            req.credential_id,
            ProfileFields {
                display_name: req.display_name,
                full_name: req.full_name,
                birth_date: req.birth_date,
                avatar_ref: req.avatar_ref,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserIdResponse { user_id })))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<ProfileView>> {
    let view = state.services.directory.get_profile_view(user_id).await?;
    Ok(Json(view))
}

pub async fn user_id_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<UserIdResponse>> {
    let user_id = state
        .services
        .directory
        .resolve_user_id_by_email(&email)
        .await?;
    Ok(Json(UserIdResponse { user_id }))
}

/// Changes the password of the authenticated user
///
/// # Errors
///
/// - `401 Unauthorized`: Current password or email does not match
/// - `403 Forbidden`: `user_id` belongs to another account
/// - `404 Not Found`: Unknown user
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    req.validate()?;

    let credential_id = state.services.directory.resolve_credential_id(user_id).await?;
    if credential_id != auth.credential_id {
        warn!(
            user_id = %user_id,
            caller = %auth.username,
            "Password change attempted for another account"
        );
        return Err(ApiError::Forbidden(
            "Cannot change another user's password".to_string(),
        ));
    }

    state
        .services
        .sessions
        .change_password(user_id, &req.current_password, &req.new_password, &req.email)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn participant_projects(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ParticipantProject>>> {
    let projects = state
        .services
        .projects
        .list_participant_projects(user_id)
        .await?;
    Ok(Json(projects))
}

pub async fn created_projects(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = state.services.projects.list_created_projects(user_id).await?;
    Ok(Json(projects))
}
