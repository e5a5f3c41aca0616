//! Bulk lookups across many tracking numbers in one request.

use std::collections::{HashMap, HashSet};

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};
use utoipa::ToSchema;

use super::shipment_detail::SHIPMENT_COLUMNS;
use crate::error::{validation::normalize_tracking_number, AppError, AppResult};
use crate::state::AppState;
use crate::types::{ShipmentRow, ShipmentSummary};

pub const MAX_BULK_ITEMS: usize = 100;

pub fn routes() -> Router<AppState> {
    Router::new().route("/lookup", post(lookup))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkLookupRequest {
    pub tracking_numbers: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkLookupResponse {
    pub found: Vec<ShipmentSummary>,
    pub missing: Vec<String>,
}

/// Normalises and de-duplicates the requested numbers, keeping first-seen order.
fn normalize_request(raw: &[String]) -> AppResult<Vec<String>> {
    if raw.is_empty() || raw.len() > MAX_BULK_ITEMS {
        return Err(AppError::ValidationError {
            field: "tracking_numbers".to_string(),
            message: format!("Provide between 1 and {} tracking numbers", MAX_BULK_ITEMS),
        });
    }
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());
    for item in raw {
        let tracking = normalize_tracking_number(item)?;
        if seen.insert(tracking.clone()) {
            out.push(tracking);
        }
    }
    Ok(out)
}

#[utoipa::path(
    post,
    path = "/api/v1/bulk/lookup",
    tag = "Bulk Operations",
    request_body = BulkLookupRequest,
    responses(
        (status = 200, body = BulkLookupResponse),
        (status = 400, description = "Empty, oversized or malformed list")
    )
)]
pub async fn lookup(
    State(state): State<AppState>,
    Json(req): Json<BulkLookupRequest>,
) -> AppResult<Json<BulkLookupResponse>> {
    let requested = normalize_request(&req.tracking_numbers)?;

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM shipments WHERE tracking_number COLLATE NOCASE IN (",
        SHIPMENT_COLUMNS
    ));
    let mut separated = qb.separated(", ");
    for tracking in &requested {
        separated.push_bind(tracking.clone());
    }
    separated.push_unseparated(")");
    let rows: Vec<ShipmentRow> = qb.build_query_as().fetch_all(&state.db).await?;

    // Requested numbers are upper-cased; stored ones may not be
    let mut by_tracking: HashMap<String, ShipmentRow> =
        rows.into_iter().map(|row| (row.tracking_number.to_ascii_uppercase(), row)).collect();

    let mut found = Vec::new();
    let mut missing = Vec::new();
    for tracking in requested {
        match by_tracking.remove(&tracking) {
            Some(row) => found.push(ShipmentSummary::from(row)),
            None => missing.push(tracking),
        }
    }

    Ok(Json(BulkLookupResponse { found, missing }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_dedupes_in_order() {
        let raw = vec!["euk-2".to_string(), "EUK-1".to_string(), " euk-2 ".to_string()];
        assert_eq!(normalize_request(&raw).unwrap(), vec!["EUK-2", "EUK-1"]);
    }

    #[test]
    fn test_normalize_bounds() {
        assert!(normalize_request(&[]).is_err());
        let too_many: Vec<String> = (0..=MAX_BULK_ITEMS).map(|i| format!("EUK{}", i)).collect();
        assert!(normalize_request(&too_many).is_err());
    }
}
