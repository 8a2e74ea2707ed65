//! Router tests over the in-memory store

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "connected");
}

#[tokio::test]
async fn test_registration_and_login() {
    let app = TestApp::new();
    let register = |username: &'static str, email: &'static str, password: &'static str| {
        json!({ "username": username, "email": email, "password": password })
    };

    let (status, _) = app
        .post("/v1/auth/register", None, register("alice", "a@x.com", "pw1"))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post("/v1/auth/register", None, register("alice", "b@x.com", "pw2"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = app
        .post("/v1/auth/register", None, register("bob", "not-an-email", "pw2"))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "email");

    // No profile linked yet
    let (status, _) = app
        .post(
            "/v1/auth/login",
            None,
            json!({ "username": "alice", "password": "pw1" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = TestApp::new();
    let alice = app.sign_up("alice").await;

    let (status, body) = app
        .post_raw("/v1/auth/register", None, "{\"username\": \"bob\",")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    // Well-formed JSON missing a required field
    let (status, body) = app
        .post_raw("/v1/projects", Some(&alice.token), "{\"description\": \"d\"}")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, body) = app.get("/v1/projects", &alice.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_login_rejects_wrong_password_uniformly() {
    let app = TestApp::new();
    app.sign_up("alice").await;

    let (wrong_status, wrong_body) = app
        .post(
            "/v1/auth/login",
            None,
            json!({ "username": "alice", "password": "wrongpw" }),
        )
        .await;
    let (unknown_status, unknown_body) = app
        .post(
            "/v1/auth/login",
            None,
            json!({ "username": "mallory", "password": "pw1" }),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["error"], "unauthorized");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/v1/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = app.get("/v1/projects", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_returns_expired_token() {
    let app = TestApp::new();
    let alice = app.sign_up("alice").await;

    let (status, body) = app
        .send(Method::POST, "/v1/auth/logout", Some(&alice.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let expired = body["token"].as_str().unwrap();
    let (status, _) = app.get("/v1/credentials", expired).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_lookups() {
    let app = TestApp::new();
    let alice = app.sign_up("alice").await;

    let (status, body) = app
        .get(&format!("/v1/users/{}", alice.user_id), &alice.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@x.com");
    assert!(body.get("password_hash").is_none());

    let (status, body) = app
        .get("/v1/users/by-email/alice@x.com", &alice.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], alice.user_id.as_str());

    let (status, body) = app
        .get("/v1/users/by-email/nobody@x.com", &alice.token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = app.get("/v1/credentials", &alice.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], alice.credential_id.as_str());
    assert_eq!(body[0]["email"], "alice@x.com");
}

#[tokio::test]
async fn test_duplicate_profile_conflicts() {
    let app = TestApp::new();
    let alice = app.sign_up("alice").await;

    let (status, _) = app
        .post(
            "/v1/users",
            None,
            json!({ "credential_id": alice.credential_id, "display_name": "again" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_change_password_only_for_self() {
    let app = TestApp::new();
    let alice = app.sign_up("alice").await;
    let bob = app.sign_up("bob").await;
    let uri = format!("/v1/users/{}/password", alice.user_id);
    let body = json!({
        "current_password": "pw1",
        "new_password": "pw2",
        "email": "alice@x.com",
    });

    let (status, _) = app
        .send(Method::PUT, &uri, Some(&bob.token), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::PUT,
            &uri,
            Some(&alice.token),
            Some(json!({
                "current_password": "pw1",
                "new_password": "pw2",
                "email": "wrong@x.com",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(Method::PUT, &uri, Some(&alice.token), Some(body))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .post(
            "/v1/auth/login",
            None,
            json!({ "username": "alice", "password": "pw2" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_project_tree_flow() {
    let app = TestApp::new();
    let alice = app.sign_up("alice").await;
    let token = alice.token.as_str();

    let (status, body) = app
        .post("/v1/projects", Some(token), json!({ "name": "P" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let pid = body["project_id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(
            &format!("/v1/projects/{}/stages", pid),
            Some(token),
            json!({ "name": "Todo" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let sid = body["stage_id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(
            &format!("/v1/projects/{}/stages/{}/tasks", pid, sid),
            Some(token),
            json!({ "assignee_user_id": alice.user_id, "description": "write docs" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let tid = body["task_id"].as_str().unwrap().to_string();

    for text in ["first", "second"] {
        let (status, _) = app
            .post(
                &format!("/v1/tasks/{}/comments", tid),
                Some(token),
                json!({ "description": text }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let comments_uri = format!("/v1/projects/{}/stages/{}/tasks/{}/comments", pid, sid, tid);
    let (status, body) = app.get(&comments_uri, token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = app
        .patch(
            &format!("/v1/tasks/{}", tid),
            token,
            json!({ "description": "write better docs" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "write better docs");

    let (status, _) = app.delete(&format!("/v1/tasks/{}", tid), token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.get(&comments_uri, token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("task {} not found", tid));

    let counts = app.store.row_counts().await;
    assert_eq!(counts.tasks, 0);
    assert_eq!(counts.comments, 0);
}

#[tokio::test]
async fn test_project_updates_and_delete() {
    let app = TestApp::new();
    let alice = app.sign_up("alice").await;
    let bob = app.sign_up("bob").await;
    let token = alice.token.as_str();

    let (_, body) = app
        .post(
            "/v1/projects",
            Some(token),
            json!({ "name": "P", "description": "first" }),
        )
        .await;
    let pid = body["project_id"].as_str().unwrap().to_string();
    let project_uri = format!("/v1/projects/{}", pid);

    let (status, _) = app.patch(&project_uri, token, json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = app
        .patch(&project_uri, token, json!({ "name": "Renamed" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Renamed");
    assert_eq!(body["description"], "first");

    let participants_uri = format!("{}/participants", project_uri);
    let (status, _) = app
        .post(&participants_uri, Some(token), json!({ "user_id": bob.user_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(&participants_uri, Some(token), json!({ "user_id": bob.user_id }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app
        .get(&format!("/v1/users/{}/projects", bob.user_id), token)
        .await;
    assert_eq!(body[0]["project_name"], "Renamed");
    assert_eq!(body[0]["creator_email"], "alice@x.com");

    let (_, body) = app
        .get(&format!("/v1/users/{}/projects/created", bob.user_id), token)
        .await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = app.delete(&project_uri, token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("{}/stages", project_uri), token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get("/v1/projects", token).await;
    assert!(body.as_array().unwrap().is_empty());
}
