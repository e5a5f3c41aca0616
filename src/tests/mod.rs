//! Integration-style tests driven through the public API of the crate.
//!
//! - **config_tests**: settings parsing, defaults, derived lists, directories
//! - **health_api_tests**: `/`, `/health`, `/readyz`
//! - **bootstrap_tests**: CORS, static mounts, docs, rate limiting, startup
//! - **route_group_tests**: the `/api/v1` route groups
//! - **error_tests**: error envelope and conversions

pub mod route_group_tests;

use std::collections::HashMap;
use std::path::Path;

use axum::body::Body;
use axum::http::Response;
use http_body_util::BodyExt;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::Settings;
use crate::state::AppState;

/// The four required variables with throwaway values.
pub(crate) fn required_vars() -> HashMap<String, String> {
    [
        ("APP_SECRET_KEY", "test-secret-key"),
        ("DATABASE_URL", "sqlite::memory:"),
        ("ADMIN_PASSWORD", "admin-pass-123"),
        ("RESEND_API_KEY", "re_test_key"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Required variables plus filesystem paths rooted in `dir`.
pub(crate) fn vars_in(dir: &Path) -> HashMap<String, String> {
    let mut vars = required_vars();
    vars.insert("UPLOAD_PATH".into(), dir.join("uploads").display().to_string());
    vars.insert("QR_CODE_PATH".into(), dir.join("qr_codes").display().to_string());
    vars.insert("LOG_FILE".into(), dir.join("logs").join("app.log").display().to_string());
    vars
}

pub(crate) fn settings_in(dir: &Path) -> Settings {
    Settings::load_from(vars_in(dir)).unwrap()
}

pub(crate) async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}

/// State over a fresh in-memory database with the schema applied.
pub(crate) async fn test_state(settings: Settings) -> AppState {
    let pool = memory_pool().await;
    crate::db::create_schema(&pool).await.unwrap();
    AppState::new(pool, settings)
}

pub(crate) async fn insert_shipment(pool: &SqlitePool, tracking: &str, status: &str) -> i64 {
    sqlx::query(
        "INSERT INTO shipments (tracking_number, status, origin, destination, sender_name, recipient_name, \
         weight_kg, description, sending_date, estimated_delivery, front_image) \
         VALUES (?, ?, 'Lagos', 'London', 'Ada Obi', 'John Smith', 12.5, 'Documents', \
         '2026-10-01', '2026-10-20', 'shipments/front.jpg')",
    )
    .bind(tracking)
    .bind(status)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

pub(crate) async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub(crate) async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
