//! Per-client token-bucket rate limiting.
//!
//! # Design Decisions
//! - The registry map lock covers lookup-or-insert only; admission runs on
//!   the returned limiter after the map lock is released
//! - Each limiter carries its own lock, so one busy client never blocks the map
//! - Lock order is always map → limiter, never the reverse
//! - With a client cap set, idle (full) buckets are evicted first since
//!   dropping one is indistinguishable from keeping it

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::RateLimitConfig;
use crate::http::response::Rejection;
use crate::observability::metrics;

/// Key used for requests that carry no connection info.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// A simple token bucket rate limiter.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    /// Tokens the bucket would hold at `now`, without touching its state.
    fn projected(&self, now: Instant, capacity: f64, refill_rate: f64) -> f64 {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();
        (self.tokens + elapsed * refill_rate).min(capacity)
    }

    fn refill(&mut self, now: Instant, capacity: f64, refill_rate: f64) {
        self.tokens = self.projected(now, capacity, refill_rate);
        self.last_update = now;
    }

    fn try_acquire(&mut self, now: Instant, capacity: f64, refill_rate: f64) -> bool {
        self.refill(now, capacity, refill_rate);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Rate limiter for a single client. Safe to share across tasks.
pub struct ClientLimiter {
    bucket: Mutex<TokenBucket>,
    rate: f64,
    burst: f64,
}

impl ClientLimiter {
    fn new(rate: f64, burst: f64, now: Instant) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(burst, now)),
            rate,
            burst,
        }
    }

    /// Consume one unit if available.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> bool {
        let mut bucket = self.bucket.lock().expect("limiter mutex poisoned");
        bucket.try_acquire(now, self.burst, self.rate)
    }

    /// Idle flag and last refill instant, read under one lock.
    ///
    /// Idle means the bucket would be full at `now`, so dropping it is
    /// indistinguishable from keeping it.
    fn snapshot_at(&self, now: Instant) -> (bool, Instant) {
        let bucket = self.bucket.lock().expect("limiter mutex poisoned");
        let idle = bucket.projected(now, self.burst, self.rate) >= self.burst;
        (idle, bucket.last_update)
    }
}

/// Registry mapping client identifiers to their limiters.
pub struct RateLimiterRegistry {
    limiters: Mutex<HashMap<String, Arc<ClientLimiter>>>,
    rate: f64,
    burst: f64,
    max_clients: usize,
    scope: &'static str,
}

impl RateLimiterRegistry {
    /// Create a registry. `max_clients == 0` never evicts.
    pub fn new(rate: f64, burst: u32, max_clients: usize) -> Self {
        Self {
            limiters: Mutex::new(HashMap::new()),
            rate,
            burst: burst as f64,
            max_clients,
            scope: "default",
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.requests_per_second,
            config.burst_size,
            config.max_tracked_clients,
        )
    }

    /// Label this registry's logs and gauge with the route group it guards.
    pub fn with_scope(mut self, scope: &'static str) -> Self {
        self.scope = scope;
        self
    }

    pub fn scope(&self) -> &'static str {
        self.scope
    }

    /// Get the limiter for `client`, creating it on first sight.
    pub fn limiter_for(&self, client: &str) -> Arc<ClientLimiter> {
        self.limiter_for_at(client, Instant::now())
    }

    fn limiter_for_at(&self, client: &str, now: Instant) -> Arc<ClientLimiter> {
        let mut limiters = self.limiters.lock().expect("rate limiter mutex poisoned");

        if let Some(limiter) = limiters.get(client) {
            return Arc::clone(limiter);
        }

        if self.max_clients > 0 && limiters.len() >= self.max_clients {
            self.evict(&mut limiters, now);
        }

        let limiter = Arc::new(ClientLimiter::new(self.rate, self.burst, now));
        limiters.insert(client.to_string(), Arc::clone(&limiter));
        metrics::record_tracked_clients(self.scope, limiters.len());
        limiter
    }

    /// Make room for one entry: drop idle buckets, else the least recently used one.
    ///
    /// Each limiter is locked once; the idle set and the LRU victim come
    /// out of the same pass.
    fn evict(&self, limiters: &mut HashMap<String, Arc<ClientLimiter>>, now: Instant) {
        let mut idle = Vec::new();
        let mut oldest: Option<(&String, Instant)> = None;

        for (key, limiter) in limiters.iter() {
            let (is_idle, last_seen) = limiter.snapshot_at(now);
            if is_idle {
                idle.push(key.clone());
            } else if oldest.map_or(true, |(_, seen)| last_seen < seen) {
                oldest = Some((key, last_seen));
            }
        }

        let victims = if idle.is_empty() {
            oldest.map(|(key, _)| key.clone()).into_iter().collect()
        } else {
            idle
        };

        for key in &victims {
            limiters.remove(key);
        }

        tracing::debug!(scope = self.scope, evicted = victims.len(), "Evicted rate limiter entries");
    }

    /// Consume one unit from `client`'s bucket. Returns false when denied.
    pub fn admit(&self, client: &str) -> bool {
        self.limiter_for(client).try_acquire()
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.limiters.lock().expect("rate limiter mutex poisoned").len()
    }
}

/// Client identifier for a request: the peer IP when known.
pub fn client_id(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Rate-limit enforcer stage.
pub async fn rate_limit_middleware(
    State(registry): State<Arc<RateLimiterRegistry>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = client_id(&request);

    if registry.admit(&client) {
        next.run(request).await
    } else {
        tracing::warn!(
            client = %client,
            scope = registry.scope(),
            tracked_clients = registry.tracked_clients(),
            path = %request.uri().path(),
            "Rate limit exceeded"
        );
        Rejection::RateLimited.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_burst_then_deny() {
        let registry = RateLimiterRegistry::new(5.0, 10, 0);
        let limiter = registry.limiter_for("10.0.0.1");
        let now = Instant::now();

        for i in 0..10 {
            assert!(limiter.try_acquire_at(now), "admit {} should pass", i);
        }
        assert!(!limiter.try_acquire_at(now));
    }

    #[test]
    fn test_refill_over_time() {
        let registry = RateLimiterRegistry::new(2.0, 2, 0);
        let limiter = registry.limiter_for("10.0.0.1");
        let start = Instant::now();

        assert!(limiter.try_acquire_at(start));
        assert!(limiter.try_acquire_at(start));
        assert!(!limiter.try_acquire_at(start));

        // 2 tokens/sec -> one token after 500ms
        let later = start + Duration::from_millis(500);
        assert!(limiter.try_acquire_at(later));
        assert!(!limiter.try_acquire_at(later));

        // Refill is capped at burst
        let much_later = later + Duration::from_secs(60);
        assert!(limiter.try_acquire_at(much_later));
        assert!(limiter.try_acquire_at(much_later));
        assert!(!limiter.try_acquire_at(much_later));
    }

    #[test]
    fn test_clients_are_independent() {
        let registry = RateLimiterRegistry::new(1.0, 1, 0);
        assert!(registry.admit("a"));
        assert!(!registry.admit("a"));
        assert!(registry.admit("b"));
        assert_eq!(registry.tracked_clients(), 2);
    }

    #[test]
    fn test_same_client_shares_one_limiter() {
        let registry = RateLimiterRegistry::new(1.0, 5, 0);
        let first = registry.limiter_for("10.0.0.1");
        let second = registry.limiter_for("10.0.0.1");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_concurrent_first_sight_creates_one_limiter() {
        let registry = Arc::new(RateLimiterRegistry::new(1.0, 100, 0));
        let barrier = Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    registry.limiter_for("203.0.113.7")
                })
            })
            .collect();

        let limiters: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(registry.tracked_clients(), 1);
        for limiter in &limiters[1..] {
            assert!(Arc::ptr_eq(&limiters[0], limiter));
        }
    }

    #[test]
    fn test_concurrent_admits_never_exceed_burst() {
        let registry = Arc::new(RateLimiterRegistry::new(0.001, 20, 0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || (0..10).filter(|_| registry.admit("shared")).count())
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 20);
    }

    #[test]
    fn test_eviction_prefers_idle_clients() {
        let registry = RateLimiterRegistry::new(1.0, 3, 2);
        let now = Instant::now();

        // "busy" has spent tokens, "idle" is untouched
        let busy = registry.limiter_for_at("busy", now);
        assert!(busy.try_acquire_at(now));
        registry.limiter_for_at("idle", now);

        registry.limiter_for_at("new", now);
        let limiters = registry.limiters.lock().unwrap();
        assert!(limiters.contains_key("busy"));
        assert!(limiters.contains_key("new"));
        assert!(!limiters.contains_key("idle"));
    }

    #[test]
    fn test_eviction_falls_back_to_least_recent() {
        let registry = RateLimiterRegistry::new(0.001, 1, 2);
        let start = Instant::now();

        let first = registry.limiter_for_at("first", start);
        assert!(first.try_acquire_at(start));
        let second = registry.limiter_for_at("second", start + Duration::from_millis(10));
        assert!(second.try_acquire_at(start + Duration::from_millis(10)));

        registry.limiter_for_at("third", start + Duration::from_millis(20));
        let limiters = registry.limiters.lock().unwrap();
        assert_eq!(limiters.len(), 2);
        assert!(!limiters.contains_key("first"));
        assert!(limiters.contains_key("second"));
    }

    #[test]
    fn test_busy_registry_stays_at_capacity() {
        let registry = RateLimiterRegistry::new(0.001, 2, 4);
        let start = Instant::now();

        for i in 0..50u64 {
            let now = start + Duration::from_millis(i);
            let client = format!("10.0.1.{}", i);
            assert!(registry.limiter_for_at(&client, now).try_acquire_at(now));
            assert!(registry.tracked_clients() <= 4);
        }

        // Only the most recent busy clients survive
        let limiters = registry.limiters.lock().unwrap();
        assert_eq!(limiters.len(), 4);
        for i in 46..50 {
            assert!(limiters.contains_key(&format!("10.0.1.{}", i)));
        }
    }

    #[test]
    fn test_client_id_from_connect_info() {
        let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(client_id(&request), UNKNOWN_CLIENT);

        let addr: SocketAddr = "192.0.2.10:54321".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(client_id(&request), "192.0.2.10");
    }
}
