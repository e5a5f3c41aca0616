//! Unauthenticated tracking lookup used by the public tracking page.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use super::shipment_detail::{find_shipment, load_timeline};
use crate::error::AppResult;
use crate::state::AppState;
use crate::types::{StatusInfo, TimelineEvent};

pub fn routes() -> Router<AppState> {
    Router::new().route("/track/{tracking}", get(track))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RouteInfo {
    pub origin: String,
    pub destination: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DateInfo {
    pub sending: Option<String>,
    pub estimated: Option<String>,
    pub actual: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PartyInfo {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommodityInfo {
    pub weight: Option<f64>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageInfo {
    pub front: Option<String>,
    pub rear: Option<String>,
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct InterventionFlags {
    pub customs_active: bool,
    pub security_active: bool,
    pub damage_reported: bool,
    pub delay_active: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackingResponse {
    pub tracking: String,
    pub status: StatusInfo,
    pub route: RouteInfo,
    pub dates: DateInfo,
    pub sender: PartyInfo,
    pub recipient: PartyInfo,
    pub commodity: CommodityInfo,
    pub images: ImageInfo,
    pub interventions: InterventionFlags,
    pub timeline: Vec<TimelineEvent>,
}

/// Maps a stored upload path to the URL it is served under.
/// Absolute paths and full URLs pass through unchanged.
pub fn upload_url(stored: &str) -> String {
    let stored = stored.trim();
    if stored.starts_with('/') || stored.starts_with("http://") || stored.starts_with("https://") {
        stored.to_string()
    } else {
        format!("/uploads/{}", stored.trim_start_matches("./"))
    }
}

async fn active_flags(db: &SqlitePool, shipment_id: i64) -> AppResult<InterventionFlags> {
    let kinds: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT kind FROM interventions WHERE shipment_id = ? AND active = 1")
            .bind(shipment_id)
            .fetch_all(db)
            .await?;

    let mut flags = InterventionFlags::default();
    for kind in kinds {
        match kind.as_str() {
            "customs" => flags.customs_active = true,
            "security" => flags.security_active = true,
            "damage" => flags.damage_reported = true,
            "delay" => flags.delay_active = true,
            other => tracing::warn!(kind = other, "ignoring unknown intervention kind"),
        }
    }
    Ok(flags)
}

#[utoipa::path(
    get,
    path = "/api/v1/public/track/{tracking}",
    tag = "Public",
    params(("tracking" = String, Path, description = "Tracking number, case-insensitive")),
    responses(
        (status = 200, body = TrackingResponse),
        (status = 400, description = "Malformed tracking number"),
        (status = 404, description = "Unknown tracking number")
    )
)]
pub async fn track(
    State(state): State<AppState>,
    Path(tracking): Path<String>,
) -> AppResult<Json<TrackingResponse>> {
    let row = find_shipment(&state.db, &tracking).await?;
    let timeline = load_timeline(&state.db, row.id).await?;
    let interventions = active_flags(&state.db, row.id).await?;

    Ok(Json(TrackingResponse {
        status: StatusInfo::from_code(&row.status),
        route: RouteInfo { origin: row.origin, destination: row.destination },
        dates: DateInfo {
            sending: row.sending_date,
            estimated: row.estimated_delivery,
            actual: row.actual_delivery,
        },
        sender: PartyInfo { name: row.sender_name },
        recipient: PartyInfo { name: row.recipient_name },
        commodity: CommodityInfo { weight: row.weight_kg, description: row.description },
        images: ImageInfo {
            front: row.front_image.as_deref().map(upload_url),
            rear: row.rear_image.as_deref().map(upload_url),
        },
        interventions,
        timeline,
        tracking: row.tracking_number,
    }))
}
