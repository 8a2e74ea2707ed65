/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register a credential
/// - `POST /v1/auth/login` - Exchange username and password for a session token
/// - `POST /v1/auth/logout` - Receive an expired copy of the current token

use crate::{
    app::AppState,
    error::{ApiError, ApiJson, ApiResult},
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use planboard_shared::{
    auth::{middleware::bearer_token, token::IssuedToken},
    services::LoginSession,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150, message = "Username must be 1-150 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub credential_id: Uuid,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    pub password: String,
}

/// Register a new credential
///
/// The account cannot log in until a profile is linked with `POST /v1/users`.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "email": "a@x.com",
///   "password": "pw1"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with `{ "credential_id": "uuid" }`
///
/// # Errors
///
/// - `400 Bad Request`: Body is not the expected JSON
/// - `409 Conflict`: Username or email already registered
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate()?;

    let credential_id = state
        .services
        .credentials
        .register(&req.username, &req.email, &req.password)
        .await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { credential_id })))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "password": "pw1"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "token": "eyJ...",
///   "expires_at": "2025-01-01T01:00:00Z",
///   "credential_id": "uuid",
///   "user_id": "uuid"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials, or no profile linked yet
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginSession>> {
    req.validate()?;

    let session = state
        .services
        .sessions
        .login(&req.username, &req.password)
        .await?;

    Ok(Json(session))
}

/// Logout endpoint
///
/// Returns an already-expired copy of the presented token. There is no
/// revocation list, so the presented token itself stays valid until it
/// expires; clients must discard it.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<IssuedToken>> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let expired = state.services.sessions.logout(token).await?;

    Ok(Json(expired))
}
