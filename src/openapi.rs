//! OpenAPI document served at `/openapi.json` and browsed through `/docs`.

use utoipa::OpenApi;

use crate::routes::{
    auth, bulk, communication, dashboard, health, interventions, public_tracking, shipment_detail, shipments,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "EukExpress API",
        version = "1.0.0",
        description = "Logistics Management Platform"
    ),
    paths(
        health::root,
        health::health,
        auth::login,
        dashboard::stats,
        shipments::list_shipments,
        shipment_detail::get_shipment,
        interventions::list_interventions,
        communication::list_communications,
        bulk::lookup,
        public_tracking::track,
    ),
    tags(
        (name = "Status", description = "Service banner and liveness"),
        (name = "Auth", description = "Credential verification"),
        (name = "Dashboard", description = "Aggregate shipment statistics"),
        (name = "Shipments", description = "Shipment listing"),
        (name = "Shipment Details", description = "Single shipment with timeline"),
        (name = "Interventions", description = "Customs, security, damage and delay holds"),
        (name = "Communication", description = "Messages sent about a shipment"),
        (name = "Bulk Operations", description = "Multi-shipment lookups"),
        (name = "Public", description = "Unauthenticated tracking")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_group_paths() {
        let doc = ApiDoc::openapi();
        assert_eq!(doc.info.title, "EukExpress API");
        assert_eq!(doc.info.version, "1.0.0");
        for path in ["/", "/health", "/api/v1/public/track/{tracking}", "/api/v1/bulk/lookup"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
