//! 로그인 잠금과 권한 체인 통합 테스트.
//!
//! 공개 API(AppState, create_router)만 사용해 HTTP 수준에서 검증합니다.

use std::sync::Arc;

use axum::{body::Body, http::Request, http::StatusCode, Router};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use bizcard_api::auth::{AuthError, AUTH_TOKEN_HEADER};
use bizcard_api::observability::{LogLevel, MemorySink};
use bizcard_api::repository::{MemoryCardStore, MemoryUserStore};
use bizcard_api::routes::create_router;
use bizcard_api::state::AppState;
use bizcard_core::{AuthConfig, LockoutPolicy};

const PASSWORD: &str = "password1";

fn setup() -> (Arc<AppState>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let state = AppState::new(
        &AuthConfig::default(),
        Arc::new(MemoryUserStore::new()),
        Arc::new(MemoryCardStore::new()),
        sink.clone(),
    );
    (Arc::new(state), sink)
}

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTH_TOKEN_HEADER, token);
    }
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn user_body(email: &str) -> Value {
    json!({
        "name": { "first": "Noa", "last": "Cohen" },
        "phone": "0521234567",
        "email": email,
        "password": PASSWORD,
        "address": { "country": "Israel", "city": "Tel Aviv", "street": "Dizengoff", "houseNumber": "10" }
    })
}

async fn register(state: &Arc<AppState>, email: &str) -> Value {
    let (status, json) = send(
        create_router(state.clone()),
        "POST",
        "/users",
        None,
        Some(user_body(email)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json
}

async fn login(state: &Arc<AppState>, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        create_router(state.clone()),
        "POST",
        "/users/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

#[tokio::test]
async fn test_fifth_failure_locks_account() {
    let (state, sink) = setup();
    register(&state, "noa@example.com").await;

    for _ in 0..4 {
        let (status, json) = login(&state, "noa@example.com", "wrong-password").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid email or password");
    }

    let (status, json) = login(&state, "noa@example.com", "wrong-password").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "ACCOUNT_LOCKED");
    assert_eq!(json["message"], "The user is block to 24 please try log in later");

    // 잠금 중에는 올바른 비밀번호도 거부
    let (status, json) = login(&state, "noa@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "ACCOUNT_LOCKED");

    let stored = state
        .users
        .find_by_email("noa@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_blocked());
    assert_eq!(stored.failed_attempts().len(), 5);

    let entries = sink.entries();
    assert_eq!(entries.len(), 6);
    assert!(entries
        .iter()
        .all(|e| e.method == "POST" && e.url == "/users/login" && e.level == LogLevel::Warn));
}

#[tokio::test]
async fn test_unknown_email_does_not_reveal_account() {
    let (state, _sink) = setup();
    register(&state, "noa@example.com").await;

    let (unknown_status, unknown) = login(&state, "ghost@example.com", PASSWORD).await;
    let (wrong_status, wrong) = login(&state, "noa@example.com", "wrong-password").await;

    assert_eq!(unknown_status, wrong_status);
    assert_eq!(unknown["message"], wrong["message"]);
}

#[tokio::test]
async fn test_lock_expires_after_block_window() {
    let (state, _sink) = setup();
    register(&state, "noa@example.com").await;

    let start = Utc::now() - Duration::hours(30);
    for i in 0..5 {
        let at = start + Duration::minutes(i);
        let _ = state.auth.login("noa@example.com", "wrong-password", at).await;
    }

    let still_locked = state
        .auth
        .login("noa@example.com", PASSWORD, start + Duration::hours(1))
        .await;
    match still_locked {
        Err(AuthError::AccountLocked {
            block_hours,
            remaining_hours,
        }) => {
            assert_eq!(block_hours, LockoutPolicy::DEFAULT_BLOCK_HOURS);
            assert!(remaining_hours > 22.0 && remaining_hours < 24.0);
        }
        other => panic!("expected lock, got {other:?}"),
    }

    let later = start + Duration::hours(25);
    let outcome = state
        .auth
        .login("noa@example.com", PASSWORD, later)
        .await
        .unwrap();
    assert!(!outcome.user.is_blocked());
    assert!(outcome.user.failed_attempts().is_empty());

    let claims = state.tokens.verify(&outcome.token).unwrap();
    assert_eq!(claims.sub, outcome.user.id);
}

#[tokio::test]
async fn test_success_resets_failure_count() {
    let (state, _sink) = setup();
    register(&state, "noa@example.com").await;

    for _ in 0..4 {
        login(&state, "noa@example.com", "wrong-password").await;
    }
    let (status, json) = login(&state, "noa@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["token"].as_str().is_some_and(|t| !t.is_empty()));

    // 카운트가 초기화되었으므로 다시 4번 실패해도 잠기지 않음
    for _ in 0..4 {
        let (_, json) = login(&state, "noa@example.com", "wrong-password").await;
        assert_eq!(json["code"], "INVALID_CREDENTIALS");
    }
    let (status, _) = login(&state, "noa@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_authorization_chain() {
    let (state, _sink) = setup();
    let owner = register(&state, "owner@example.com").await;
    register(&state, "other@example.com").await;

    let (_, json) = login(&state, "other@example.com", PASSWORD).await;
    let other_token = json["token"].as_str().unwrap().to_string();
    let owner_path = format!("/users/{}", owner["id"].as_str().unwrap());

    // 토큰 없음
    let (status, json) = send(create_router(state.clone()), "GET", &owner_path, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Access denied. No token provided.");

    // 위조 토큰
    let (status, json) = send(
        create_router(state.clone()),
        "GET",
        &owner_path,
        Some("not-a-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Invalid token.");

    // 다른 사용자 (본인도 관리자도 아님)
    let (status, json) = send(
        create_router(state.clone()),
        "PUT",
        &owner_path,
        Some(&other_token),
        Some(user_body("owner@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "You dont have permissions!!!");
    assert_eq!(json["method"], "PUT");
    assert_eq!(json["path"], owner_path);

    // 관리자 전용 목록
    let (status, json) = send(
        create_router(state.clone()),
        "GET",
        "/users",
        Some(&other_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "You dont have permissions!!!");
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let (state, sink) = setup();

    let (status, json) = send(create_router(state), "GET", "/nowhere", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "404 Page not found");
    assert_eq!(json["method"], "GET");
    assert_eq!(json["path"], "/nowhere");
    assert_eq!(sink.entries()[0].url, "/nowhere");
}
