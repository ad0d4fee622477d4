//! Common test utilities for the HTTP tests
//!
//! The router runs against an in-memory store, so no database is needed.
//! Users are inserted directly and given freshly minted access tokens, which
//! skips the deliberately slow password hashing except where a test goes
//! through `/auth` on purpose.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use workboard_api::app::{build_router, AppState};
use workboard_api::config::{ApiConfig, Config, DatabaseConfig};
use workboard_shared::auth::jwt::{JwtSettings, TokenType};
use workboard_shared::models::user::{CreateUser, User};
use workboard_shared::store::{MemoryStore, Store};

/// Test context holding the router and the store behind it
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub config: Config,
}

/// A user and a bearer token for them
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtSettings::new(
            "test-access-secret-0123456789abcdef",
            "test-refresh-secret-0123456789abcdef",
            Duration::minutes(15),
            Duration::days(7),
        ),
    }
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let config = test_config();
        let app = build_router(AppState::new(store.clone(), config.clone()));

        Self { app, store, config }
    }

    /// Inserts a user and mints an access token for them
    pub async fn user(&self, email: &str) -> TestUser {
        let user = self
            .store
            .create_user(CreateUser {
                email: email.to_string(),
                password_hash: "not-a-real-hash".to_string(),
                name: None,
            })
            .await
            .expect("create user");

        let (token, _) = self
            .config
            .jwt
            .issue(user.id, TokenType::Access)
            .expect("issue token");

        TestUser { user, token }
    }

    /// Sends one request and returns the status and parsed JSON body
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
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self.app.clone().oneshot(request).await.expect("call router");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, value)
    }

    pub async fn get(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(&user.token), None).await
    }

    pub async fn post(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(&user.token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(&user.token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(&user.token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(&user.token), None).await
    }

    /// Creates an organization owned by `owner`, returning its JSON
    pub async fn organization(&self, owner: &TestUser, name: &str) -> Value {
        let (status, body) = self
            .post("/api/v1/organizations", owner, serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body
    }

    /// Invites `user` into `slug` with `role` and accepts on their behalf
    pub async fn join(&self, owner: &TestUser, slug: &str, user: &TestUser, role: &str) {
        let (status, invitation) = self
            .post(
                &format!("/api/v1/organizations/{}/invite", slug),
                owner,
                serde_json::json!({ "email": user.user.email, "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", invitation);

        let (status, body) = self
            .post(
                "/api/v1/organizations/accept-invite",
                user,
                serde_json::json!({ "token": invitation["token"] }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
    }
}

/// Error code of an error envelope
pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}
