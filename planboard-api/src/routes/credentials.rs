/// Credential listing
///
/// - `GET /v1/credentials` - IDs and emails of every registered credential

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use planboard_shared::models::CredentialSummary;

pub async fn list_credentials(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<CredentialSummary>>> {
    let summaries = state.services.credentials.list_summaries().await?;
    Ok(Json(summaries))
}
