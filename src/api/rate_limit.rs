use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DashMapStateStore;
use governor::{Quota, RateLimiter};

use crate::api::AppState;
use crate::error::AppError;

/// Rate limiter keyed by client IP.
pub type IpRateLimiter = Arc<RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock>>;

pub fn create_ip_rate_limiter(per_minute: u32, burst: u32) -> IpRateLimiter {
    let per_minute = NonZeroU32::new(per_minute.max(1)).expect("per_minute is at least one");
    let burst = NonZeroU32::new(burst.max(1)).expect("burst is at least one");
    let quota = Quota::per_minute(per_minute).allow_burst(burst);
    Arc::new(RateLimiter::dashmap(quota))
}

/// Middleware for the AI-backed endpoints: requests beyond the per-IP quota
/// get HTTP 429 with the remaining wait time.
pub async fn ip_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let forwarded_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());

    let ip = forwarded_ip.or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    });

    match ip {
        Some(ip) => match state.limiter.check_key(&ip) {
            Ok(_) => Ok(next.run(request).await),
            Err(negative) => {
                let wait = negative.wait_time_from(DefaultClock::default().now());
                Err(AppError::TooManyRequests(wait.as_secs()))
            }
        },
        None => {
            log::warn!("Could not determine client IP for rate limiting");
            Ok(next.run(request).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_is_enforced_per_key() {
        let limiter = create_ip_rate_limiter(60, 3);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        for _ in 0..3 {
            assert!(limiter.check_key(&ip).is_ok());
        }
        assert!(limiter.check_key(&ip).is_err());

        // A different client still has its own budget.
        let other: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(limiter.check_key(&other).is_ok());
    }

    #[test]
    fn zero_config_values_are_clamped() {
        let limiter = create_ip_rate_limiter(0, 0);
        let ip: IpAddr = "10.0.0.3".parse().unwrap();
        assert!(limiter.check_key(&ip).is_ok());
    }
}
