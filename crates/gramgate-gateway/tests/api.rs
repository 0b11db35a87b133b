// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end API tests: real router, real SQLite store, scripted
//! MTProto client.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use gramgate_connect::ConnectionManager;
use gramgate_core::{AccountRegistry, ClientFactory};
use gramgate_gateway::{AppState, router};
use gramgate_storage::SqliteStore;
use gramgate_test_utils::{ScriptedClient, ScriptedFactory};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn test_app(clients: Vec<Arc<ScriptedClient>>) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let registry: Arc<dyn AccountRegistry> = Arc::new(store.clone());
    let factory: Arc<dyn ClientFactory> = Arc::new(ScriptedFactory::new(clients));
    let manager = ConnectionManager::new(registry, factory, Duration::from_secs(300));
    router(AppState {
        store,
        manager,
        token_ttl_hours: 168,
        dialogs_page_limit: 50,
    })
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register_and_login(app: &Router, username: &str) -> String {
    let creds = json!({ "username": username, "password": "hunter2hunter2" });
    let (status, _) = send(app, "POST", "/v1/auth/register", None, Some(creds.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(app, "POST", "/v1/auth/login", None, Some(creds)).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_owned()
}

async fn create_account(app: &Router, token: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/v1/accounts",
        Some(token),
        Some(json!({ "phone": "+15551234567", "api_id": 12345, "api_hash": "abcdef0123456789" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app(vec![]).await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let app = test_app(vec![]).await;
    let (status, body) = send(&app, "GET", "/v1/accounts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, _) = send(&app, "GET", "/v1/accounts", Some("ggt_bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = test_app(vec![]).await;
    let _ = register_and_login(&app, "alice").await;

    let (status, _) = send(
        &app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn account_crud_and_validation() {
    let app = test_app(vec![]).await;
    let token = register_and_login(&app, "alice").await;
    let id = create_account(&app, &token).await;

    // Duplicate phone for the same owner.
    let (status, body) = send(
        &app,
        "POST",
        "/v1/accounts",
        Some(&token),
        Some(json!({ "phone": "+15551234567", "api_id": 1, "api_hash": "x0x0" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ACCOUNT_EXISTS");

    // Malformed phone.
    let (status, body) = send(
        &app,
        "POST",
        "/v1/accounts",
        Some(&token),
        Some(json!({ "phone": "555", "api_id": 1, "api_hash": "x0x0" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "PHONE_NUMBER_INVALID");

    // Read back, patch, list.
    let (status, body) = send(&app, "GET", &format!("/v1/accounts/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "offline");
    assert_eq!(body["has_session"], false);
    assert!(body.get("api_hash").is_none());

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/v1/accounts/{id}"),
        Some(&token),
        Some(json!({ "name": "work" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "work");

    let (status, body) = send(&app, "GET", "/v1/accounts", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &format!("/v1/accounts/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &format!("/v1/accounts/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn other_users_accounts_are_invisible() {
    let app = test_app(vec![]).await;
    let alice = register_and_login(&app, "alice").await;
    let id = create_account(&app, &alice).await;

    let mallory = register_and_login(&app, "mallory").await;
    let (status, body) = send(&app, "GET", &format!("/v1/accounts/{id}"), Some(&mallory), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "ACCOUNT_NOT_FOUND");
}

#[tokio::test]
async fn full_connect_flow_over_http() {
    let client = ScriptedClient::new();
    client.push_dialogs(Ok(vec![gramgate_core::DialogSummary {
        id: 7,
        title: Some("news".into()),
        username: Some("daily_news".into()),
        unread_count: 2,
    }]));
    let app = test_app(vec![client]).await;
    let token = register_and_login(&app, "alice").await;
    let id = create_account(&app, &token).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/v1/accounts/{id}/connect"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "code_required");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/v1/accounts/{id}/verify-code"),
        Some(&token),
        Some(json!({ "code": "12345" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "connected");

    let (status, body) = send(
        &app,
        "GET",
        &format!("/v1/accounts/{id}/dialogs?limit=10"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], 7);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/v1/accounts/{id}/disconnect"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "offline");

    // Session blob survives the disconnect.
    let (_, body) = send(&app, "GET", &format!("/v1/accounts/{id}"), Some(&token), None).await;
    assert_eq!(body["has_session"], true);
}

#[tokio::test]
async fn verify_without_pending_challenge_is_forbidden() {
    let app = test_app(vec![ScriptedClient::new()]).await;
    let token = register_and_login(&app, "alice").await;
    let id = create_account(&app, &token).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/v1/accounts/{id}/verify-code"),
        Some(&token),
        Some(json!({ "code": "12345" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "NOT_CONNECTED");
}

#[tokio::test]
async fn flood_wait_surfaces_retry_after() {
    let client = ScriptedClient::new();
    client.push_request_code(Err(gramgate_core::GramgateError::FloodWait { seconds: 30 }));
    let app = test_app(vec![client]).await;
    let token = register_and_login(&app, "alice").await;
    let id = create_account(&app, &token).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/v1/accounts/{id}/connect"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "FLOOD_WAIT");
    assert_eq!(body["seconds"], 30);
}
