use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use super::shipment_detail::find_shipment;
use crate::error::AppResult;
use crate::state::AppState;
use crate::types::{InterventionDto, InterventionRow};

pub fn routes() -> Router<AppState> {
    Router::new().route("/{tracking}/interventions", get(list_interventions))
}

/// Interventions recorded against a shipment, active ones first.
#[utoipa::path(
    get,
    path = "/api/v1/shipments/{tracking}/interventions",
    tag = "Interventions",
    params(("tracking" = String, Path, description = "Tracking number")),
    responses(
        (status = 200, body = [InterventionDto]),
        (status = 404, description = "Unknown tracking number")
    )
)]
pub async fn list_interventions(
    State(state): State<AppState>,
    Path(tracking): Path<String>,
) -> AppResult<Json<Vec<InterventionDto>>> {
    let shipment = find_shipment(&state.db, &tracking).await?;
    let rows = sqlx::query_as::<_, InterventionRow>(
        "SELECT id, kind, reason, active, created_at, resolved_at FROM interventions \
         WHERE shipment_id = ? ORDER BY active DESC, created_at DESC, id DESC",
    )
    .bind(shipment.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows.into_iter().map(InterventionDto::from).collect()))
}
