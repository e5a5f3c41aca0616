use super::ip::client_ip;
use axum::{
    extract::{connect_info::ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

use crate::error::AppError;

/// A thread-safe rate limiter based on the sliding window algorithm.
#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<RwLock<HashMap<IpAddr, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
    trusted_proxies: Arc<[IpAddr]>,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per `window_seconds` per IP.
    pub fn new(max_requests: usize, window_seconds: u64) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_seconds),
            trusted_proxies: Arc::from(Vec::new()),
        }
    }

    /// Peers allowed to name the client through `X-Forwarded-For`/`X-Real-IP`.
    pub fn with_trusted_proxies(mut self, proxies: Vec<IpAddr>) -> Self {
        self.trusted_proxies = Arc::from(proxies);
        self
    }

    /// Client IP used as the bucket key for `req`.
    pub fn client_ip(&self, req: &Request) -> IpAddr {
        let peer = req.extensions().get::<ConnectInfo<SocketAddr>>().map(|info| info.0.ip());
        client_ip(req.headers(), peer, &self.trusted_proxies)
    }

    /// Records a request from `ip` if it fits in the current window.
    pub async fn check_rate_limit(&self, ip: IpAddr) -> Result<(), AppError> {
        let now = Instant::now();
        let mut requests = self.requests.write().await;

        let timestamps = requests.entry(ip).or_default();

        // On clock skew keep the timestamp rather than freeing a slot
        timestamps.retain(|&t| now.checked_duration_since(t).map(|d| d < self.window).unwrap_or(true));

        if timestamps.len() >= self.max_requests {
            let oldest = timestamps.first().copied().unwrap_or(now);
            let retry_after = match now.checked_duration_since(oldest) {
                Some(elapsed) => self.window.saturating_sub(elapsed),
                None => Duration::from_secs(1),
            };
            // Round up so clients never retry before the slot frees
            let retry_after_seconds = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            return Err(AppError::RateLimited { retry_after_seconds });
        }

        timestamps.push(now);
        Ok(())
    }

    /// Drops IPs whose timestamps have all left the window.
    pub async fn cleanup_old_entries(&self) {
        let now = Instant::now();
        let mut requests = self.requests.write().await;

        requests.retain(|_, timestamps| {
            timestamps.retain(|&t| now.checked_duration_since(t).map(|d| d < self.window).unwrap_or(true));
            !timestamps.is_empty()
        });
    }

    /// Number of IPs currently tracked.
    pub async fn tracked_clients(&self) -> usize {
        self.requests.read().await.len()
    }
}

/// Rejects requests over the per-IP limit with `429 Too Many Requests`.
pub async fn rate_limit_middleware(State(limiter): State<RateLimiter>, req: Request, next: Next) -> Response {
    let ip = limiter.client_ip(&req);

    match limiter.check_rate_limit(ip).await {
        Ok(()) => next.run(req).await,
        Err(e) => {
            tracing::debug!(%ip, "rate limit exceeded");
            e.into_response()
        }
    }
}

/// Periodically prunes `limiter` so idle clients do not accumulate.
pub async fn cleanup_task(limiter: RateLimiter, every: Duration) {
    let mut interval = tokio::time::interval(every);

    loop {
        interval.tick().await;
        limiter.cleanup_old_entries().await;
    }
}
