use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use super::shipment_detail::find_shipment;
use crate::error::AppResult;
use crate::state::AppState;
use crate::types::{CommunicationDto, CommunicationRow};

pub fn routes() -> Router<AppState> {
    Router::new().route("/{tracking}/communications", get(list_communications))
}

/// Message log for a shipment, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/shipments/{tracking}/communications",
    tag = "Communication",
    params(("tracking" = String, Path, description = "Tracking number")),
    responses(
        (status = 200, body = [CommunicationDto]),
        (status = 404, description = "Unknown tracking number")
    )
)]
pub async fn list_communications(
    State(state): State<AppState>,
    Path(tracking): Path<String>,
) -> AppResult<Json<Vec<CommunicationDto>>> {
    let shipment = find_shipment(&state.db, &tracking).await?;
    let rows = sqlx::query_as::<_, CommunicationRow>(
        "SELECT id, direction, channel, recipient, subject, body, created_at FROM communications \
         WHERE shipment_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(shipment.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows.into_iter().map(CommunicationDto::from).collect()))
}
