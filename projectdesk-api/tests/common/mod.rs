//! Common test utilities for integration tests
//!
//! Every [`TestContext`] owns a private in-memory SQLite database, migrated
//! and seeded with the default administrator, plus a router built exactly as
//! the server builds it. Requests go through `tower::Service::call`.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use projectdesk_api::app::{build_router, AppState};
use projectdesk_api::config::{Config, Environment};
use projectdesk_shared::db::{
    migrations::run_migrations,
    pool::{create_pool, DatabaseConfig},
    seed::ensure_admin_user,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::Service as _;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";
pub const TEST_PASSWORD: &str = "secret1";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: SqlitePool,
    pub app: Router,
    pub config: Config,
}

/// A registered user and their token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub token: String,
}

impl TestContext {
    /// Creates a context with a fresh database
    pub async fn new() -> anyhow::Result<Self> {
        let db = create_pool(DatabaseConfig::in_memory()).await?;
        run_migrations(&db).await?;

        let mut config = Config::default();
        config.api.environment = Environment::Test;
        config.jwt.secret = TEST_JWT_SECRET.to_string();
        config.rate_limit.max_requests = 10_000;

        ensure_admin_user(&db, &config.admin_seed()).await?;

        let app = build_router(AppState::new(db.clone(), config.clone()));

        Ok(Self { db, app, config })
    }

    /// Sends a request and returns the status and JSON body
    ///
    /// An empty body comes back as `Value::Null`.
    pub async fn request(
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
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("Non-JSON body ({}): {}", status, String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(token), None).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers a user with [`TEST_PASSWORD`], asserting success
    pub async fn register(&self, name: &str, email: &str) -> TestUser {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "name": name, "email": email, "password": TEST_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_i64().unwrap(),
            email: email.to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Logs in as the seeded administrator
    pub async fn admin(&self) -> TestUser {
        let (status, body) = self
            .login(&self.config.admin.email, &self.config.admin.password)
            .await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_i64().unwrap(),
            email: self.config.admin.email.clone(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a project owned by `owner`, asserting success
    pub async fn create_project(&self, owner: &TestUser, name: &str, priority: &str) -> i64 {
        let (status, body) = self
            .post(
                "/api/projects",
                &owner.token,
                json!({ "name": name, "priority": priority }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {}", body);

        body["projectId"].as_i64().unwrap()
    }

    /// Creates a task, asserting success; `extra` fields are merged in
    pub async fn create_task(
        &self,
        user: &TestUser,
        project_id: i64,
        title: &str,
        extra: Value,
    ) -> i64 {
        let mut payload = json!({ "title": title, "priority": "medium", "project_id": project_id });
        if let (Some(payload), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
            for (key, value) in extra {
                payload.insert(key.clone(), value.clone());
            }
        }

        let (status, body) = self.post("/api/tasks", &user.token, payload).await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {}", body);

        body["taskId"].as_i64().unwrap()
    }

    /// Moves a row's `updated_at` into the past so a later update is visible
    pub async fn backdate(&self, table: &str, id: i64) {
        let sql = format!(
            "UPDATE {} SET updated_at = '2000-01-01 00:00:00' WHERE id = ?",
            table
        );
        sqlx::query(&sql).bind(id).execute(&self.db).await.unwrap();
    }

    pub async fn count(&self, sql: &str, id: i64) -> i64 {
        let (count,): (i64,) = sqlx::query_as(sql).bind(id).fetch_one(&self.db).await.unwrap();
        count
    }
}
