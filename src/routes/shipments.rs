use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use sqlx::{QueryBuilder, Sqlite};

use super::shipment_detail::SHIPMENT_COLUMNS;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::types::{ListShipmentsQuery, PaginationMeta, ShipmentPage, ShipmentRow, ShipmentStatus, ShipmentSummary};

const MAX_SEARCH_LEN: usize = 100;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_shipments))
}

struct ListFilter {
    status: Option<ShipmentStatus>,
    search: Option<String>,
}

impl ListFilter {
    fn from_query(query: &ListShipmentsQuery) -> AppResult<Self> {
        let status = match query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(code) => Some(ShipmentStatus::from_code(code).ok_or_else(|| AppError::ValidationError {
                field: "status".to_string(),
                message: format!("Unknown shipment status '{}'", code),
            })?),
            None => None,
        };

        let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
        if let Some(term) = search {
            if term.len() > MAX_SEARCH_LEN {
                return Err(AppError::ValidationError {
                    field: "search".to_string(),
                    message: format!("Search term exceeds {} characters", MAX_SEARCH_LEN),
                });
            }
        }

        Ok(Self { status, search: search.map(str::to_string) })
    }

    fn push_where<'a>(&self, qb: &mut QueryBuilder<'a, Sqlite>) {
        let mut has_where = false;
        if let Some(status) = self.status {
            qb.push(" WHERE status = ").push_bind(status.code());
            has_where = true;
        }
        if let Some(term) = &self.search {
            let pattern = format!("%{}%", escape_like(term));
            qb.push(if has_where { " AND (" } else { " WHERE (" });
            qb.push("tracking_number LIKE ").push_bind(pattern.clone()).push(" ESCAPE '\\'");
            qb.push(" OR sender_name LIKE ").push_bind(pattern.clone()).push(" ESCAPE '\\'");
            qb.push(" OR recipient_name LIKE ").push_bind(pattern).push(" ESCAPE '\\')");
        }
    }
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[utoipa::path(
    get,
    path = "/api/v1/shipments",
    tag = "Shipments",
    params(ListShipmentsQuery),
    responses(
        (status = 200, body = ShipmentPage),
        (status = 400, description = "Invalid filter")
    )
)]
pub async fn list_shipments(
    State(state): State<AppState>,
    Query(query): Query<ListShipmentsQuery>,
) -> AppResult<Json<ShipmentPage>> {
    let filter = ListFilter::from_query(&query)?;
    let (page, per_page) = (query.page(), query.per_page());

    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM shipments");
    filter.push_where(&mut count_qb);
    let total: i64 = count_qb.build_query_scalar().fetch_one(&state.db).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM shipments", SHIPMENT_COLUMNS));
    filter.push_where(&mut qb);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(i64::from(per_page))
        .push(" OFFSET ")
        .push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));
    let rows: Vec<ShipmentRow> = qb.build_query_as().fetch_all(&state.db).await?;

    Ok(Json(ShipmentPage {
        data: rows.into_iter().map(ShipmentSummary::from).collect(),
        meta: PaginationMeta::new(page, per_page, total.max(0) as u64),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("EUK_10%"), "EUK\\_10\\%");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_filter_rejects_unknown_status() {
        let query = ListShipmentsQuery { page: None, per_page: None, status: Some("LOST".into()), search: None };
        assert!(matches!(ListFilter::from_query(&query), Err(AppError::ValidationError { .. })));
    }

    #[test]
    fn test_filter_accepts_lowercase_status() {
        let query =
            ListShipmentsQuery { page: None, per_page: None, status: Some("in_transit".into()), search: Some("  ".into()) };
        let filter = ListFilter::from_query(&query).unwrap();
        assert_eq!(filter.status, Some(ShipmentStatus::InTransit));
        assert!(filter.search.is_none());
    }
}
