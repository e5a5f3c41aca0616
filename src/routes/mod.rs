//! HTTP route handlers.
//!
//! Status endpoints live in [`health`]; everything else is a route group
//! mounted under `/api/v1` by [`api_router`]. Each group owns its handlers
//! and error mapping; the bootstrap only knows the prefix.

pub mod auth;
pub mod bulk;
pub mod communication;
pub mod dashboard;
pub mod health;
pub mod interventions;
pub mod public_tracking;
pub mod shipment_detail;
pub mod shipments;

use axum::Router;

use crate::state::AppState;

/// A set of handlers registered under one path prefix.
pub struct RouteGroup {
    pub name: &'static str,
    /// Prefix relative to `/api/v1`
    pub prefix: &'static str,
    pub routes: fn() -> Router<AppState>,
}

pub fn route_groups() -> [RouteGroup; 8] {
    [
        RouteGroup { name: "auth", prefix: "/auth", routes: auth::routes },
        RouteGroup { name: "dashboard", prefix: "/dashboard", routes: dashboard::routes },
        RouteGroup { name: "shipments", prefix: "/shipments", routes: shipments::routes },
        RouteGroup { name: "shipment_detail", prefix: "/shipments", routes: shipment_detail::routes },
        RouteGroup { name: "interventions", prefix: "/shipments", routes: interventions::routes },
        RouteGroup { name: "communication", prefix: "/shipments", routes: communication::routes },
        RouteGroup { name: "bulk", prefix: "/bulk", routes: bulk::routes },
        RouteGroup { name: "public_tracking", prefix: "/public", routes: public_tracking::routes },
    ]
}

/// All route groups, nested by prefix. Groups sharing a prefix are merged
/// first so each prefix is nested once.
pub fn api_router() -> Router<AppState> {
    let mut by_prefix: Vec<(&'static str, Router<AppState>)> = Vec::new();
    for group in route_groups() {
        tracing::debug!(group = group.name, prefix = group.prefix, "registering route group");
        match by_prefix.iter_mut().find(|(prefix, _)| *prefix == group.prefix) {
            Some((_, router)) => *router = std::mem::take(router).merge((group.routes)()),
            None => by_prefix.push((group.prefix, (group.routes)())),
        }
    }
    by_prefix.into_iter().fold(Router::new(), |api, (prefix, router)| api.nest(prefix, router))
}
