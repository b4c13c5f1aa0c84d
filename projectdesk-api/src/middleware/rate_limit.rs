/// Per-IP rate limiting for the `/api` routes
///
/// # Algorithm
///
/// Token bucket, one bucket per client IP:
/// - A bucket holds up to `max_requests` tokens and starts full
/// - Tokens refill continuously at `max_requests / window` per second
/// - Each request consumes 1 token
/// - A request that finds the bucket empty gets 429
///
/// Buckets live in process memory, so limits are per server instance.
///
/// # Headers
///
/// - `X-RateLimit-Limit`: requests allowed per window
/// - `X-RateLimit-Remaining`: tokens left after this request
/// - `Retry-After`: seconds until a token is available (429 responses only)

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::config::RateLimitConfig;
use crate::error::ApiError;

/// Key used when the peer address is not available
const UNKNOWN_CLIENT: &str = "unknown";

/// Bucket count above which idle buckets are swept
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: u32, now: Instant) -> Self {
        Self {
            tokens: f64::from(capacity),
            last_refill: now,
        }
    }

    fn refill(&mut self, rate: f64, capacity: u32, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(f64::from(capacity));
        self.last_refill = now;
    }

    fn try_consume(&mut self) -> bool {
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn seconds_until_available(&self, rate: f64) -> u64 {
        let deficit = 1.0 - self.tokens;
        if deficit <= 0.0 {
            0
        } else {
            (deficit / rate).ceil().max(1.0) as u64
        }
    }

    fn is_full(&self, capacity: u32) -> bool {
        self.tokens >= f64::from(capacity)
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds to wait before retrying; zero when allowed
    pub retry_after: u64,
}

/// In-memory token buckets keyed by client
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    refill_rate: f64,
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl RateLimiter {
    /// Allows `max_requests` per `window`
    ///
    /// `max_requests` and `window` are clamped to at least 1 and 1 second.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let capacity = max_requests.max(1);
        let window_secs = window.as_secs_f64().max(1.0);

        Self {
            capacity,
            refill_rate: f64::from(capacity) / window_secs,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }

    pub fn limit(&self) -> u32 {
        self.capacity
    }

    /// Consumes a token for `key` if one is available
    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if buckets.len() > SWEEP_THRESHOLD {
            let (rate, capacity) = (self.refill_rate, self.capacity);
            buckets.retain(|_, bucket| {
                bucket.refill(rate, capacity, now);
                !bucket.is_full(capacity)
            });
        }

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.capacity, now));
        bucket.refill(self.refill_rate, self.capacity, now);

        let allowed = bucket.try_consume();

        RateLimitDecision {
            allowed,
            limit: self.capacity,
            remaining: bucket.tokens.floor() as u32,
            retry_after: if allowed {
                0
            } else {
                bucket.seconds_until_available(self.refill_rate)
            },
        }
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// Client key for a request: the peer IP, or `unknown`
fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn insert_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert("X-RateLimit-Limit", HeaderValue::from(decision.limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(decision.remaining));
}

/// Rate limiting middleware
///
/// # Errors
///
/// - 429 Too Many Requests: the client's bucket is empty
pub async fn rate_limit_layer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = client_key(&request);
    let decision = state.rate_limiter.check(&key);

    if !decision.allowed {
        tracing::warn!(
            client = %key,
            retry_after = decision.retry_after,
            "Rate limit exceeded"
        );

        let mut response = ApiError::RateLimitExceeded {
            retry_after: decision.retry_after,
            message: format!(
                "Too many requests. Try again in {} seconds",
                decision.retry_after
            ),
        }
        .into_response();
        insert_limit_headers(response.headers_mut(), &decision);
        return response;
    }

    let mut response = next.run(request).await;
    insert_limit_headers(response.headers_mut(), &decision);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_bucket_allows_up_to_capacity() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        let remaining: Vec<u32> = (0..3)
            .map(|_| limiter.check_at("10.0.0.1", now))
            .inspect(|d| assert!(d.allowed))
            .map(|d| d.remaining)
            .collect();
        assert_eq!(remaining, vec![2, 1, 0]);

        let blocked = limiter.check_at("10.0.0.1", now);
        assert!(!blocked.allowed);
        assert_eq!(blocked.remaining, 0);
        assert_eq!(blocked.retry_after, 20);
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check_at("10.0.0.1", now).allowed);
        assert!(!limiter.check_at("10.0.0.1", now).allowed);
        assert!(limiter.check_at("10.0.0.2", now).allowed);
    }

    #[test]
    fn test_tokens_refill_over_time() {
        let limiter = RateLimiter::new(2, Duration::from_secs(10));
        let start = Instant::now();

        assert!(limiter.check_at("a", start).allowed);
        assert!(limiter.check_at("a", start).allowed);
        assert!(!limiter.check_at("a", start).allowed);

        // 2 tokens per 10s: one token after 5s
        let later = start + Duration::from_secs(5);
        assert!(limiter.check_at("a", later).allowed);
        assert!(!limiter.check_at("a", later).allowed);

        // Never refills beyond capacity
        let much_later = start + Duration::from_secs(3600);
        assert_eq!(limiter.check_at("a", much_later).remaining, 1);
    }

    #[test]
    fn test_default_budget() {
        let limiter = RateLimiter::from_config(&RateLimitConfig {
            max_requests: 100,
            window_secs: 900,
        });
        let now = Instant::now();

        for _ in 0..100 {
            assert!(limiter.check_at("client", now).allowed);
        }
        let blocked = limiter.check_at("client", now);
        assert!(!blocked.allowed);
        assert_eq!(blocked.retry_after, 9);
        assert_eq!(limiter.limit(), 100);
    }

    #[test]
    fn test_zero_config_is_clamped() {
        let limiter = RateLimiter::new(0, Duration::ZERO);
        assert_eq!(limiter.limit(), 1);
        assert!(limiter.check("x").allowed);
    }

    #[test]
    fn test_sweep_drops_refilled_buckets() {
        let limiter = RateLimiter::new(1, Duration::from_secs(1));
        let start = Instant::now();

        for i in 0..=SWEEP_THRESHOLD {
            limiter.check_at(&format!("client-{}", i), start);
        }
        assert_eq!(limiter.tracked_clients(), SWEEP_THRESHOLD + 1);

        limiter.check_at("late", start + Duration::from_secs(5));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_client_key_falls_back_to_unknown() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(client_key(&request), UNKNOWN_CLIENT);

        let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 7], 40000))));
        assert_eq!(client_key(&request), "192.168.1.7");
    }
}
