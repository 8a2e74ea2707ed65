//! Bearer-token authentication middleware for axum
//!
//! Reads `Authorization: Bearer <token>`, resolves it through
//! [`Sessions::authenticate`] and stores an [`AuthContext`] in the request
//! extensions for handlers to extract.
//!
//! ```no_run
//! use axum::{middleware, routing::get, Extension, Router};
//! use planboard_shared::auth::middleware::{session_auth, AuthContext};
//! use planboard_shared::services::Sessions;
//!
//! async fn me(Extension(auth): Extension<AuthContext>) -> String {
//!     auth.username
//! }
//!
//! fn router(sessions: Sessions) -> Router {
//!     Router::new()
//!         .route("/me", get(me))
//!         .layer(middleware::from_fn_with_state(sessions, session_auth))
//! }
//! ```

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::error::{Error, ErrorKind, INVALID_TOKEN};
use crate::services::Sessions;

/// Authenticated caller, inserted into request extensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub credential_id: Uuid,
    pub username: String,
}

#[derive(Debug)]
pub enum AuthError {
    /// No Authorization header
    MissingCredentials,

    /// Header present but not a Bearer token
    InvalidFormat,

    /// Token rejected
    InvalidToken,

    /// Store failure while resolving the token subject
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => (StatusCode::UNAUTHORIZED, "Missing bearer token"),
            AuthError::InvalidFormat => (StatusCode::UNAUTHORIZED, "Expected Bearer token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, INVALID_TOKEN),
            AuthError::Internal(detail) => {
                error!(error = %detail, "Authentication failed internally");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let kind = if status == StatusCode::UNAUTHORIZED {
            ErrorKind::Auth
        } else {
            ErrorKind::Server
        };

        let body = Json(serde_json::json!({
            "error": kind.as_str(),
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Extracts the token from an `Authorization` header value
pub fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware for `axum::middleware::from_fn_with_state`
pub async fn session_auth(
    State(sessions): State<Sessions>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // Owned copy: the request must not stay borrowed across the await below
    let token = {
        let header_value = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingCredentials)?;

        bearer_token(header_value)
            .ok_or(AuthError::InvalidFormat)?
            .to_string()
    };

    let credential = sessions.authenticate(&token).await.map_err(|e| match e {
        Error::Auth(_) => AuthError::InvalidToken,
        other => AuthError::Internal(other.to_string()),
    })?;

    req.extensions_mut().insert(AuthContext {
        credential_id: credential.id,
        username: credential.username,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{body::Body, middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    use crate::auth::password::HashingConfig;
    use crate::auth::token::TokenConfig;
    use crate::models::ProfileFields;
    use crate::services::Services;
    use crate::store::MemoryStore;

    const SECRET: &str = "middleware-test-secret-at-least-32-bytes";

    async fn me(Extension(auth): Extension<AuthContext>) -> String {
        auth.username
    }

    async fn setup() -> (Router, Services) {
        let hashing = HashingConfig {
            memory_kib: 8192,
            iterations: 1,
            parallelism: 1,
        };
        let services = Services::new(
            Arc::new(MemoryStore::new()),
            hashing,
            TokenConfig::new(SECRET),
        )
        .unwrap();

        let router = Router::new()
            .route("/me", get(me))
            .layer(middleware::from_fn_with_state(
                services.sessions.clone(),
                session_auth,
            ));

        (router, services)
    }

    fn request(authorization: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/me");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic abc"), None);
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let (router, _) = setup().await;
        let response = router.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let (router, _) = setup().await;
        let response = router
            .oneshot(request(Some("Bearer not-a-jwt")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_session_reaches_handler() {
        let (router, services) = setup().await;

        let credential_id = services
            .credentials
            .register("alice", "a@x.com", "pw1")
            .await
            .unwrap();
        services
            .directory
            .create_profile(credential_id, ProfileFields::default())
            .await
            .unwrap();
        let session = services.sessions.login("alice", "pw1").await.unwrap();

        let response = router
            .oneshot(request(Some(&format!("Bearer {}", session.token))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"alice");
    }
}
