//! # EukExpress Backend Library
//!
//! HTTP JSON backend for the EukExpress logistics platform: shipment listing
//! and detail, interventions, communications, bulk lookups and public
//! tracking over SQLite, plus static serving of uploads and QR codes.
//!
//! ## Architecture
//!
//! - **Axum**: HTTP server and routing
//! - **SQLx**: asynchronous SQLite access
//! - **Tokio**: async runtime
//! - **utoipa**: OpenAPI schema and Swagger UI
//!
//! ## Core Components
//!
//! - [`config`]: environment-driven [`config::Settings`] and directory provisioning
//! - [`app`]: router assembly, CORS, static mounts and lifecycle hooks
//! - [`db`]: connection pool, schema declaration and admin seeding
//! - [`error`]: centralized error handling and HTTP error responses
//! - [`middleware`]: rate limiting and security headers
//! - [`routes`]: status endpoints and the `/api/v1` route groups
//! - [`state`]: shared application state
//! - [`types`]: database rows and response DTOs

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod password;
pub mod routes;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;
