//! Per-IP rate limiting for the admin login route

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::error::{AppError, ErrorCode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::state::AppState;

/// Login attempts allowed per IP and window
const LOGIN_MAX_ATTEMPTS: u32 = 5;
const LOGIN_WINDOW: Duration = Duration::from_secs(60);

struct IpEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// route name -> (IP -> entry)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, IpEntry>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if the request is allowed
    async fn check(&self, route: &'static str, ip: &str, max_requests: u32, window: Duration) -> bool {
        let mut map = self.inner.lock().await;
        let route_map = map.entry(route).or_default();
        let now = Instant::now();

        let entry = route_map.entry(ip.to_owned()).or_insert_with(|| IpEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= max_requests
    }

    /// Drop entries whose window started more than `max_age` ago
    pub async fn cleanup(&self, max_age: Duration) {
        let mut map = self.inner.lock().await;
        let now = Instant::now();

        for route_map in map.values_mut() {
            route_map.retain(|_, entry| now.duration_since(entry.window_start) < max_age);
        }
        map.retain(|_, route_map| !route_map.is_empty());
    }

    #[cfg(test)]
    async fn tracked_ips(&self) -> usize {
        self.inner.lock().await.values().map(HashMap::len).sum()
    }
}

/// Client IP: first X-Forwarded-For entry, then the peer address
fn extract_ip(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let ip = first.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

/// Admin login: 5 attempts per minute per IP
pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let ip = extract_ip(&request);
    if !state
        .rate_limiter
        .check("admin_login", &ip, LOGIN_MAX_ATTEMPTS, LOGIN_WINDOW)
        .await
    {
        tracing::warn!(ip = %ip, "Admin login rate limited");
        return Err(AppError::new(ErrorCode::TooManyAttempts).into_response());
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[tokio::test]
    async fn allows_up_to_limit_per_ip() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            assert!(limiter.check("login", "1.1.1.1", 3, LOGIN_WINDOW).await);
        }
        assert!(!limiter.check("login", "1.1.1.1", 3, LOGIN_WINDOW).await);
        assert!(limiter.check("login", "2.2.2.2", 3, LOGIN_WINDOW).await);
        assert!(limiter.check("other", "1.1.1.1", 3, LOGIN_WINDOW).await);
    }

    #[tokio::test]
    async fn window_resets() {
        let limiter = RateLimiter::new();
        assert!(limiter.check("login", "1.1.1.1", 1, Duration::ZERO).await);
        assert!(limiter.check("login", "1.1.1.1", 1, Duration::ZERO).await);
    }

    #[tokio::test]
    async fn cleanup_drops_stale_entries() {
        let limiter = RateLimiter::new();
        limiter.check("login", "1.1.1.1", 5, LOGIN_WINDOW).await;
        limiter.cleanup(Duration::from_secs(300)).await;
        assert_eq!(limiter.tracked_ips().await, 1);
        limiter.cleanup(Duration::ZERO).await;
        assert_eq!(limiter.tracked_ips().await, 0);
    }

    #[test]
    fn ip_from_forwarded_header() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_ip(&request), "203.0.113.7");

        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_ip(&request), "unknown");
    }
}
