use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Settings;
use crate::middleware::RateLimiter;

/// The shared application state handed to every handler.
///
/// Cloning is cheap: the pool and limiter are reference-counted and the
/// settings sit behind an `Arc` that is never written after startup.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    ///
    /// Handlers borrow a connection per query; it is returned to the pool
    /// when the query future completes or is dropped.
    pub db: SqlitePool,
    /// The validated process configuration.
    pub settings: Arc<Settings>,
    /// Per-IP limiter for the `/api/v1` routes, sized from
    /// `RATE_LIMIT_REQUESTS` / `RATE_LIMIT_PERIOD`, trusting proxy headers
    /// only from `TRUSTED_PROXIES`.
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(db: SqlitePool, settings: Settings) -> Self {
        let rate_limiter = RateLimiter::new(settings.rate_limit_requests as usize, settings.rate_limit_period)
            .with_trusted_proxies(settings.trusted_proxies_list());
        Self { db, settings: Arc::new(settings), rate_limiter }
    }
}
