use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app::{APP_TITLE, APP_VERSION, DOCS_PATH};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct RootResponse {
    pub app: String,
    pub version: String,
    pub status: String,
    pub environment: String,
    pub docs: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Current UTC time, ISO-8601
    pub time: String,
    pub database: String,
}

/// Service banner with the configured environment.
#[utoipa::path(get, path = "/", tag = "Status", responses((status = 200, body = RootResponse)))]
pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        app: APP_TITLE.to_string(),
        version: APP_VERSION.to_string(),
        status: "running".to_string(),
        environment: state.settings.app_env.clone(),
        docs: DOCS_PATH.to_string(),
    })
}

/// Liveness probe. Never touches the database; see `/readyz` for that.
#[utoipa::path(get, path = "/health", tag = "Status", responses((status = 200, body = HealthResponse)))]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        database: "connected".to_string(),
    })
}

// Readiness probe: checks DB connectivity with timeout protection
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let query = sqlx::query("SELECT 1").fetch_one(&state.db);
    match tokio::time::timeout(std::time::Duration::from_secs(5), query).await {
        Ok(Ok(_)) => (StatusCode::OK, "ready").into_response(),
        Ok(Err(e)) => (StatusCode::SERVICE_UNAVAILABLE, format!("not ready: {}", e)).into_response(),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "not ready: timeout").into_response(),
    }
}
