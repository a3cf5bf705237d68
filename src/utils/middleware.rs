use crate::{error::AppError, state::AppState};
use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use governor::{clock::DefaultClock, state::keyed::DashMapStateStore, Quota, RateLimiter};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc};
use tracing::{debug, warn};

pub type KeyedRateLimiter = RateLimiter<String, DashMapStateStore<String>, DefaultClock>;

/// Per-client limiter refilling `requests_per_minute`, bursting to the same
/// amount (never fewer than 10).
pub fn build_rate_limiter(requests_per_minute: u32) -> KeyedRateLimiter {
    let per_minute = NonZeroU32::new(requests_per_minute.max(1)).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(requests_per_minute.max(10)).unwrap_or(NonZeroU32::MIN);
    RateLimiter::dashmap(Quota::per_minute(per_minute).allow_burst(burst))
}

/// Rejects clients over quota with 429.
pub async fn rate_limit_middleware<B>(
    State(app_state): State<Arc<AppState>>,
    request: Request<B>,
    next: Next<B>,
) -> Result<Response, AppError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr);
    let client_ip = client_ip(request.headers(), peer);

    match app_state.rate_limiter.check_key(&client_ip) {
        Ok(_) => {
            debug!("Rate limit check passed for IP: {}", client_ip);
            Ok(next.run(request).await)
        }
        Err(_) => {
            warn!("Rate limit exceeded for IP: {}", client_ip);
            Err(AppError::RateLimitExceeded)
        }
    }
}

/// Best-effort client address: proxy headers first, then the socket.
pub fn client_ip(headers: &HeaderMap, peer: Option<&SocketAddr>) -> String {
    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return ip.to_string();
    }

    if let Some(ip) = headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return ip.to_string();
    }

    if let Some(forwarded) = headers.get("forwarded").and_then(|h| h.to_str().ok()) {
        for part in forwarded.split(';') {
            if let Some(ip) = part.trim().strip_prefix("for=") {
                return ip.trim_matches('"').to_string();
            }
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
