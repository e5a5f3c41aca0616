use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Lifecycle states a shipment moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Booked,
    InTransit,
    Customs,
    OnHold,
    OutForDelivery,
    Delivered,
    Returned,
}

impl ShipmentStatus {
    pub const ALL: [ShipmentStatus; 7] = [
        ShipmentStatus::Booked,
        ShipmentStatus::InTransit,
        ShipmentStatus::Customs,
        ShipmentStatus::OnHold,
        ShipmentStatus::OutForDelivery,
        ShipmentStatus::Delivered,
        ShipmentStatus::Returned,
    ];

    /// Storage and wire code, e.g. `IN_TRANSIT`.
    pub fn code(self) -> &'static str {
        match self {
            ShipmentStatus::Booked => "BOOKED",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::Customs => "CUSTOMS",
            ShipmentStatus::OnHold => "ON_HOLD",
            ShipmentStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            ShipmentStatus::Delivered => "DELIVERED",
            ShipmentStatus::Returned => "RETURNED",
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            ShipmentStatus::Booked => "Booked",
            ShipmentStatus::InTransit => "In Transit",
            ShipmentStatus::Customs => "Customs Clearance",
            ShipmentStatus::OnHold => "On Hold",
            ShipmentStatus::OutForDelivery => "Out for Delivery",
            ShipmentStatus::Delivered => "Delivered",
            ShipmentStatus::Returned => "Returned to Sender",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL.into_iter().find(|s| s.code().eq_ignore_ascii_case(code))
    }
}

/// Display label for a stored status code; unknown codes are shown verbatim.
pub fn status_display(code: &str) -> String {
    ShipmentStatus::from_code(code).map(|s| s.display().to_string()).unwrap_or_else(|| code.to_string())
}

// ---------------- Database rows ----------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShipmentRow {
    pub id: i64,
    pub tracking_number: String,
    pub status: String,
    pub origin: String,
    pub destination: String,
    pub current_location: Option<String>,
    pub sender_name: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub weight_kg: Option<f64>,
    pub description: Option<String>,
    pub sending_date: Option<String>,
    pub estimated_delivery: Option<String>,
    pub actual_delivery: Option<String>,
    pub front_image: Option<String>,
    pub rear_image: Option<String>,
    pub qr_code: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    pub status: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InterventionRow {
    pub id: i64,
    pub kind: String,
    pub reason: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub resolved_at: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommunicationRow {
    pub id: i64,
    pub direction: String,
    pub channel: String,
    pub recipient: Option<String>,
    pub subject: Option<String>,
    pub body: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

// ---------------- Response DTOs ----------------

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusInfo {
    pub current: String,
    pub display: String,
}

impl StatusInfo {
    pub fn from_code(code: &str) -> Self {
        Self { current: code.to_string(), display: status_display(code) }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TimelineEvent {
    pub status: String,
    pub display: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub timestamp: String,
}

impl From<EventRow> for TimelineEvent {
    fn from(row: EventRow) -> Self {
        Self {
            display: status_display(&row.status),
            status: row.status,
            location: row.location,
            description: row.description,
            timestamp: row.created_at,
        }
    }
}

/// Compact shipment view used by listings and bulk lookups.
#[derive(Debug, Serialize, ToSchema)]
pub struct ShipmentSummary {
    pub tracking: String,
    pub status: StatusInfo,
    pub origin: String,
    pub destination: String,
    pub recipient_name: Option<String>,
    pub estimated_delivery: Option<String>,
    pub created_at: String,
}

impl From<ShipmentRow> for ShipmentSummary {
    fn from(row: ShipmentRow) -> Self {
        Self {
            status: StatusInfo::from_code(&row.status),
            tracking: row.tracking_number,
            origin: row.origin,
            destination: row.destination,
            recipient_name: row.recipient_name,
            estimated_delivery: row.estimated_delivery,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShipmentDetail {
    pub tracking: String,
    pub status: StatusInfo,
    pub origin: String,
    pub destination: String,
    pub current_location: Option<String>,
    pub sender_name: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub weight_kg: Option<f64>,
    pub description: Option<String>,
    pub sending_date: Option<String>,
    pub estimated_delivery: Option<String>,
    pub actual_delivery: Option<String>,
    pub front_image: Option<String>,
    pub rear_image: Option<String>,
    pub qr_code: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub timeline: Vec<TimelineEvent>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InterventionDto {
    pub id: i64,
    pub kind: String,
    pub reason: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub resolved_at: Option<String>,
}

impl From<InterventionRow> for InterventionDto {
    fn from(row: InterventionRow) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
            reason: row.reason,
            active: row.active,
            created_at: row.created_at,
            resolved_at: row.resolved_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommunicationDto {
    pub id: i64,
    pub direction: String,
    pub channel: String,
    pub recipient: Option<String>,
    pub subject: Option<String>,
    pub body: String,
    pub created_at: String,
}

impl From<CommunicationRow> for CommunicationDto {
    fn from(row: CommunicationRow) -> Self {
        Self {
            id: row.id,
            direction: row.direction,
            channel: row.channel,
            recipient: row.recipient,
            subject: row.subject,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

// ---------------- Pagination ----------------

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListShipmentsQuery {
    /// 1-based page number
    pub page: Option<u32>,
    /// Items per page, capped at 100
    pub per_page: Option<u32>,
    /// Filter by status code, e.g. `IN_TRANSIT`
    pub status: Option<String>,
    /// Substring match on tracking number, sender or recipient
    pub search: Option<String>,
}

impl ListShipmentsQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.per_page())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        Self { page, per_page, total, total_pages: total.div_ceil(u64::from(per_page.max(1))) }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShipmentPage {
    pub data: Vec<ShipmentSummary>,
    pub meta: PaginationMeta,
}
