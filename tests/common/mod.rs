#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tokio::sync::broadcast;
use tower::ServiceExt;

use kanban_views::api::{create_router, AppState};
use kanban_views::auth::jwt;
use kanban_views::config::Config;
use kanban_views::infrastructure::{db, SettingsCache};
use kanban_views::services::{EntityStore, PermissionService};

pub const DOCTYPE: &str = "Task";
pub const FIELD: &str = "status";

/// A migrated database in a throwaway directory. Keep the `TempDir` alive
/// for as long as the pool is used.
pub async fn setup_test_db() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite:{}", dir.path().join("test.db").display());
    let pool = db::init_db(&url)
        .await
        .expect("Failed to create test database");
    (dir, pool)
}

pub async fn token_for(pool: &SqlitePool, user: &str) -> String {
    let key = jwt::get_or_create_signing_key(pool)
        .await
        .expect("Failed to create signing key");
    jwt::create_token(&key, user, 3600).expect("Failed to create token")
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        refresh_delay_ms: 0,
        ..Config::default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub sse_rx: broadcast::Receiver<String>,
    pub settings_cache: SettingsCache,
}

pub fn make_app(pool: SqlitePool) -> TestApp {
    let (sse_tx, sse_rx) = broadcast::channel(100);
    let config = Arc::new(test_config());
    let settings_cache = SettingsCache::new();
    let state = AppState::new(
        Some(pool),
        sse_tx,
        reqwest::Client::new(),
        Arc::clone(&config),
        settings_cache.clone(),
    );

    TestApp {
        router: create_router(state, &config),
        sse_rx,
        settings_cache,
    }
}

pub async fn make_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, String) {
    let mut request = Request::builder().uri(uri).method(method);

    if body.is_some() {
        request = request.header("content-type", "application/json");
    }
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {}", token));
    }

    let request = request
        .body(Body::from(body.map(|b| b.to_string()).unwrap_or_default()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8(body.to_vec()).unwrap();

    (status, body_str)
}

pub async fn make_json_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let (status, body) = make_request(app, method, uri, body, token).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).unwrap_or(Value::String(body))
    };
    (status, value)
}

pub async fn seed_task(pool: &SqlitePool, name: &str, status: &str) {
    EntityStore::insert(pool, DOCTYPE, name, &json!({ "status": status, "subject": name }))
        .await
        .expect("Failed to seed task");
}

pub async fn grant_write(pool: &SqlitePool, user: &str) {
    PermissionService::grant(pool, user, DOCTYPE, true, true)
        .await
        .expect("Failed to grant permission");
}

pub fn column_order(board: &Value, column: &str) -> Vec<String> {
    board["columns"]
        .as_array()
        .expect("columns array")
        .iter()
        .find(|c| c["name"] == column)
        .map(|c| serde_json::from_value(c["order"].clone()).unwrap())
        .unwrap_or_default()
}
