use std::collections::BTreeMap;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;
use crate::state::AppState;
use crate::types::ShipmentStatus;

pub fn routes() -> Router<AppState> {
    Router::new().route("/stats", get(stats))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_shipments: i64,
    /// Count per status code; every known status is present, zero or not
    pub by_status: BTreeMap<String, i64>,
    pub active_interventions: i64,
    pub created_last_7_days: i64,
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    tag = "Dashboard",
    responses((status = 200, body = DashboardStats))
)]
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    let grouped: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM shipments GROUP BY status")
            .fetch_all(&state.db)
            .await?;

    let mut by_status: BTreeMap<String, i64> =
        ShipmentStatus::ALL.iter().map(|s| (s.code().to_string(), 0)).collect();
    let mut total_shipments = 0;
    for (status, count) in grouped {
        total_shipments += count;
        *by_status.entry(status).or_insert(0) += count;
    }

    let active_interventions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM interventions WHERE active = 1")
        .fetch_one(&state.db)
        .await?;

    let created_last_7_days: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM shipments WHERE created_at >= strftime('%Y-%m-%dT%H:%M:%SZ','now','-7 days')",
    )
    .fetch_one(&state.db)
    .await?;

    Ok(Json(DashboardStats { total_shipments, by_status, active_interventions, created_last_7_days }))
}
