//! Security headers middleware for HTTP responses.
//!
//! Adds hardening headers to every response and marks JSON API responses as
//! non-cacheable. Static uploads keep their default caching.

use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::config::Settings;

const HSTS_MAX_AGE: u64 = 31_536_000;

/// Adds standard security-related HTTP headers to all responses.
///
/// - `X-Content-Type-Options: nosniff`
/// - `X-Frame-Options: SAMEORIGIN`
/// - `Referrer-Policy: strict-origin-when-cross-origin`
/// - `Permissions-Policy: geolocation=(), microphone=(), camera=()`
/// - `Strict-Transport-Security` when `APP_ENV` is `production`
///
/// JSON responses additionally get `Cache-Control: no-store`.
pub async fn security_headers_middleware(
    State(settings): State<Arc<Settings>>,
    req: Request,
    next: Next,
) -> Response {
    let mut res = next.run(req).await;
    let headers = res.headers_mut();

    headers.insert(HeaderName::from_static("x-content-type-options"), HeaderValue::from_static("nosniff"));
    headers.insert(HeaderName::from_static("x-frame-options"), HeaderValue::from_static("SAMEORIGIN"));
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
    );

    if settings.is_production() {
        let value = format!("max-age={}; includeSubDomains", HSTS_MAX_AGE);
        if let Ok(v) = HeaderValue::from_str(&value) {
            headers.insert(HeaderName::from_static("strict-transport-security"), v);
        }
    }

    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .map(|s| s.starts_with("application/json"))
        .unwrap_or(false);
    if is_json {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    }

    res
}
