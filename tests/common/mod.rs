#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use curriculum::api::router;
use curriculum::generation::{ContentGenerator, NoopContentGenerator};
use curriculum::state::AppState;

pub async fn setup_pool() -> SqlitePool {
    curriculum::db::memory_pool()
        .await
        .expect("Failed to create test db")
}

pub fn app_with(pool: SqlitePool, generator: Arc<dyn ContentGenerator>) -> Router {
    router(AppState { db: pool, generator })
}

pub fn app(pool: SqlitePool) -> Router {
    app_with(pool, Arc::new(NoopContentGenerator))
}

pub async fn table_count(pool: &SqlitePool, table: &str) -> i64 {
    let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("Failed to count rows");
    row.0
}

/// Send one request through the router and decode the JSON body, if any.
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Router failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}
