/// Integration tests for registration, login and token handling
///
/// Covers:
/// - Registration and duplicate emails
/// - Login failures and successful token issuance
/// - Expired, tampered and orphaned tokens on protected routes
/// - Public health endpoints

mod common;

use axum::http::{Method, StatusCode};
use chrono::Duration;
use common::{TestContext, TEST_JWT_SECRET, TEST_PASSWORD};
use projectdesk_shared::auth::jwt::{create_token, verify_token, Claims};
use serde_json::json;

#[tokio::test]
async fn test_register_returns_token_and_user_role() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "A", "email": "a@x.com", "password": "secret1" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["role"], "user");
    assert_eq!(body["user"]["email"], "a@x.com");
    assert!(body["user"].get("password_hash").is_none());

    let claims = verify_token(body["token"].as_str().unwrap(), TEST_JWT_SECRET).unwrap();
    assert_eq!(claims.sub, body["user"]["id"].as_i64().unwrap());
}

#[tokio::test]
async fn test_duplicate_email_is_rejected_without_new_row() {
    let ctx = TestContext::new().await.unwrap();
    ctx.register("Ana", "ana@example.com").await;

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Ana 2", "email": " ANA@example.com ", "password": "secret2" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "conflict");
    assert!(body.get("token").is_none());

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind("ana@example.com")
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    assert_eq!(count.0, 1);
}

#[tokio::test]
async fn test_register_validation_lists_every_field() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "", "email": "nope", "password": "123" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "name", "password"]);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .request(Method::POST, "/api/auth/login", None, Some(json!("just a string")))
        .await;

    assert_eq!(response.0, StatusCode::BAD_REQUEST);
    assert!(response.1["message"].is_string());
}

#[tokio::test]
async fn test_login_failures_return_401_without_token() {
    let ctx = TestContext::new().await.unwrap();
    ctx.register("Ana", "ana@example.com").await;

    let (status, body) = ctx.login("ana@example.com", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("token").is_none());

    let (status, body) = ctx.login("ghost@example.com", TEST_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("token").is_none());
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_returns_token_for_stored_user() {
    let ctx = TestContext::new().await.unwrap();
    let ana = ctx.register("Ana", "ana@example.com").await;

    let (status, body) = ctx.login("Ana@Example.com", TEST_PASSWORD).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    let claims = verify_token(body["token"].as_str().unwrap(), TEST_JWT_SECRET).unwrap();
    assert_eq!(claims.sub, ana.id);
}

#[tokio::test]
async fn test_seeded_admin_can_log_in() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.login("admin@projeto.com", "admin123").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "admin");
}

#[tokio::test]
async fn test_verify_endpoint() {
    let ctx = TestContext::new().await.unwrap();
    let ana = ctx.register("Ana", "ana@example.com").await;

    let (status, body) = ctx.get("/api/auth/verify", &ana.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "valid": true, "userId": ana.id }));

    let (status, _) = ctx.request(Method::GET, "/api/auth/verify", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_rejects_bad_tokens() {
    let ctx = TestContext::new().await.unwrap();
    let ana = ctx.register("Ana", "ana@example.com").await;

    // Missing
    let (status, body) = ctx.request(Method::GET, "/api/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Access token required");

    // Expired
    let expired = create_token(
        &Claims::with_expiration(ana.id, Duration::hours(-2)),
        TEST_JWT_SECRET,
    )
    .unwrap();
    let (status, _) = ctx.get("/api/projects", &expired).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Signed with another secret
    let forged = create_token(&Claims::new(ana.id), "some-other-secret").unwrap();
    let (status, _) = ctx.get("/api/projects", &forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Payload swapped under the original signature
    let mut parts: Vec<String> = ana.token.split('.').map(str::to_string).collect();
    let other = create_token(&Claims::new(ana.id + 1), TEST_JWT_SECRET).unwrap();
    parts[1] = other.split('.').nth(1).unwrap().to_string();
    let (status, _) = ctx.get("/api/projects", &parts.join(".")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Still valid
    let (status, _) = ctx.get("/api/projects", &ana.token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_token_of_deleted_user_is_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let token = create_token(&Claims::new(9_999), TEST_JWT_SECRET).unwrap();

    let (status, body) = ctx.get("/api/tasks", &token).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn test_public_health_endpoints() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    let (status, body) = ctx.request(Method::GET, "/api/test", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
}
