/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login and logout
/// - `credentials`: Credential listing
/// - `users`: Profiles, password changes and per-user project lists
/// - `projects`: Projects and the stage/task/comment tree beneath them
/// - `tasks`: Task edits, deletion and new comments
/// - `comments`: Comment edits and deletion

pub mod auth;
pub mod comments;
pub mod credentials;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;

use crate::{app::AppState, error::ApiResult};
use planboard_shared::auth::middleware::AuthContext;
use uuid::Uuid;

/// Resolves the authenticated caller to their user ID
pub(crate) async fn caller_user_id(state: &AppState, auth: &AuthContext) -> ApiResult<Uuid> {
    Ok(state
        .services
        .directory
        .resolve_user_id_by_credential(auth.credential_id)
        .await?)
}
