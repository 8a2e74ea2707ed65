//! Shared fixtures for router tests
//!
//! Every test gets its own in-memory store and router; requests go through
//! `tower::ServiceExt::oneshot` without binding a socket.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use planboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use planboard_shared::{auth::password::HashingConfig, store::MemoryStore, Services};
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "api-test-secret-key-at-least-32-bytes";

pub struct TestApp {
    pub store: MemoryStore,
    pub router: Router,
}

/// A signed-in user
pub struct Session {
    pub token: String,
    pub credential_id: String,
    pub user_id: String,
}

impl TestApp {
    pub fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "STORE" => Some("memory".to_string()),
            "TOKEN_SECRET" => Some(SECRET.to_string()),
            _ => None,
        })
        .expect("config");

        let store = MemoryStore::new();
        let hashing = HashingConfig {
            memory_kib: 8192,
            iterations: 1,
            parallelism: 1,
        };
        let services = Services::new(
            Arc::new(store.clone()),
            hashing,
            config.token_config().expect("token config"),
        )
        .expect("services");

        let router = build_router(AppState::new(services, Arc::new(store.clone()), config));

        Self { store, router }
    }

    /// Sends a request and returns the status with the parsed JSON body
    /// (`Value::Null` for empty bodies)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.dispatch(request).await
    }

    /// Posts `body` verbatim as `application/json`
    pub async fn post_raw(&self, uri: &str, token: Option<&str>, body: &str) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        self.dispatch(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers `{name}` with email `{name}@x.com` and password "pw1",
    /// links a profile and logs in
    pub async fn sign_up(&self, name: &str) -> Session {
        let (status, body) = self
            .post(
                "/v1/auth/register",
                None,
                serde_json::json!({
                    "username": name,
                    "email": format!("{}@x.com", name),
                    "password": "pw1",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register: {}", body);
        let credential_id = body["credential_id"].as_str().unwrap().to_string();

        let (status, body) = self
            .post(
                "/v1/users",
                None,
                serde_json::json!({
                    "credential_id": credential_id,
                    "display_name": name,
                    "full_name": format!("{} Example", name),
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "profile: {}", body);

        let (status, body) = self
            .post(
                "/v1/auth/login",
                None,
                serde_json::json!({ "username": name, "password": "pw1" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login: {}", body);

        Session {
            token: body["token"].as_str().unwrap().to_string(),
            credential_id,
            user_id: body["user_id"].as_str().unwrap().to_string(),
        }
    }
}
