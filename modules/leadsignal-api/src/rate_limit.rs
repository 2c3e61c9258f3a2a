use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

/// Prune the whole map once it tracks more clients than this.
const PRUNE_THRESHOLD: usize = 1000;

/// Sliding-window check for one client. Returns true if the request is
/// allowed, recording it; false if the client is over the limit.
pub fn check_rate_limit(
    entries: &mut Vec<Instant>,
    now: Instant,
    window: Duration,
    max_requests: usize,
) -> bool {
    if let Some(cutoff) = now.checked_sub(window) {
        entries.retain(|t| *t > cutoff);
    }
    if entries.len() >= max_requests {
        return false;
    }
    entries.push(now);
    true
}

/// Drop clients whose every request has aged out of the window.
pub fn prune_empty_entries(
    limiter: &mut HashMap<IpAddr, Vec<Instant>>,
    now: Instant,
    window: Duration,
) {
    let cutoff = now.checked_sub(window);
    limiter.retain(|_, entries| {
        if let Some(cutoff) = cutoff {
            entries.retain(|t| *t > cutoff);
        }
        !entries.is_empty()
    });
}

/// Middleware for `/api/*`: per-IP sliding window.
pub async fn enforce(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let max = state.config.rate_limit_max_requests;
    let window = state.config.rate_limit_window;
    let now = Instant::now();

    {
        let mut limiter = state.rate_limiter.lock().await;
        if limiter.len() > PRUNE_THRESHOLD {
            prune_empty_entries(&mut limiter, now, window);
        }
        let entries = limiter.entry(addr.ip()).or_default();
        if !check_rate_limit(entries, now, window, max) {
            warn!(path = request.uri().path(), "Rate limit exceeded");
            return Err(ApiError::RateLimited {
                max,
                window_secs: window.as_secs(),
            });
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let mut entries = Vec::new();
        let now = Instant::now();
        for _ in 0..30 {
            assert!(check_rate_limit(&mut entries, now, MINUTE, 30));
        }
        assert!(!check_rate_limit(&mut entries, now, MINUTE, 30));
        assert_eq!(entries.len(), 30);
    }

    #[test]
    fn window_slides() {
        let start = Instant::now();
        let mut entries = Vec::new();
        assert!(check_rate_limit(&mut entries, start, MINUTE, 2));
        assert!(check_rate_limit(&mut entries, start + Duration::from_secs(30), MINUTE, 2));
        assert!(!check_rate_limit(&mut entries, start + Duration::from_secs(59), MINUTE, 2));

        // The first request has aged out; the one at +30s still counts.
        assert!(check_rate_limit(&mut entries, start + Duration::from_secs(61), MINUTE, 2));
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn prune_drops_idle_clients() {
        let start = Instant::now();
        let mut limiter: HashMap<IpAddr, Vec<Instant>> = HashMap::new();
        limiter.insert("10.0.0.1".parse().unwrap(), vec![start]);
        limiter.insert(
            "10.0.0.2".parse().unwrap(),
            vec![start, start + Duration::from_secs(90)],
        );

        prune_empty_entries(&mut limiter, start + Duration::from_secs(100), MINUTE);

        assert_eq!(limiter.len(), 1);
        let kept = &limiter[&"10.0.0.2".parse::<IpAddr>().unwrap()];
        assert_eq!(kept.len(), 1);
    }
}
