use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use sqlx::SqlitePool;

use crate::error::{validation::normalize_tracking_number, AppResult, OptionExt};
use crate::state::AppState;
use crate::types::{EventRow, ShipmentDetail, ShipmentRow, StatusInfo, TimelineEvent};

pub(crate) const SHIPMENT_COLUMNS: &str = "id, tracking_number, status, origin, destination, current_location, \
     sender_name, recipient_name, recipient_email, weight_kg, description, sending_date, \
     estimated_delivery, actual_delivery, front_image, rear_image, qr_code, created_at, updated_at";

pub fn routes() -> Router<AppState> {
    Router::new().route("/{tracking}", get(get_shipment))
}

/// Looks up a shipment by tracking number, ignoring case on both sides.
pub(crate) async fn find_shipment(db: &SqlitePool, raw_tracking: &str) -> AppResult<ShipmentRow> {
    let tracking = normalize_tracking_number(raw_tracking)?;
    let sql = format!("SELECT {} FROM shipments WHERE tracking_number = ? COLLATE NOCASE", SHIPMENT_COLUMNS);
    sqlx::query_as::<_, ShipmentRow>(&sql)
        .bind(&tracking)
        .fetch_optional(db)
        .await?
        .ok_or_not_found(&format!("Shipment {}", tracking))
}

/// Timeline events, oldest first.
pub(crate) async fn load_timeline(db: &SqlitePool, shipment_id: i64) -> AppResult<Vec<TimelineEvent>> {
    let rows = sqlx::query_as::<_, EventRow>(
        "SELECT status, location, description, created_at FROM shipment_events \
         WHERE shipment_id = ? ORDER BY created_at ASC, id ASC",
    )
    .bind(shipment_id)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(TimelineEvent::from).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/shipments/{tracking}",
    tag = "Shipment Details",
    params(("tracking" = String, Path, description = "Tracking number")),
    responses(
        (status = 200, body = ShipmentDetail),
        (status = 400, description = "Malformed tracking number"),
        (status = 404, description = "Unknown tracking number")
    )
)]
pub async fn get_shipment(
    State(state): State<AppState>,
    Path(tracking): Path<String>,
) -> AppResult<Json<ShipmentDetail>> {
    let row = find_shipment(&state.db, &tracking).await?;
    let timeline = load_timeline(&state.db, row.id).await?;

    Ok(Json(ShipmentDetail {
        status: StatusInfo::from_code(&row.status),
        tracking: row.tracking_number,
        origin: row.origin,
        destination: row.destination,
        current_location: row.current_location,
        sender_name: row.sender_name,
        recipient_name: row.recipient_name,
        recipient_email: row.recipient_email,
        weight_kg: row.weight_kg,
        description: row.description,
        sending_date: row.sending_date,
        estimated_delivery: row.estimated_delivery,
        actual_delivery: row.actual_delivery,
        front_image: row.front_image,
        rear_image: row.rear_image,
        qr_code: row.qr_code,
        created_at: row.created_at,
        updated_at: row.updated_at,
        timeline,
    }))
}
