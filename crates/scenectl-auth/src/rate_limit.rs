//! Per-client-IP token bucket rate limiting (§4.3).

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use scenectl_metrics::MetricsRegistry;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
    last_used: Instant,
}

/// Configuration for a single rate limiter instance.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub burst: u32,
    pub rate_per_minute: u32,
}

impl RateLimitConfig {
    pub fn refill_per_second(&self) -> f64 {
        self.rate_per_minute as f64 / 60.0
    }

    /// Buckets idle for longer than 10x their refill interval are reaped.
    pub fn reap_after(&self) -> Duration {
        let refill_interval = if self.rate_per_minute == 0 { 60.0 } else { 60.0 / self.rate_per_minute as f64 };
        Duration::from_secs_f64(refill_interval * 10.0)
    }
}

/// A per-client-IP token bucket. One instance is shared across every
/// request-handling worker via `Arc`; internal state is guarded by a single
/// mutex, matching §5's "RateLimiter bucket map: one mutex; bucket entries
/// are small" policy.
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<std::collections::HashMap<IpAddr, Bucket>>,
    metrics: Arc<MetricsRegistry>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, metrics: Arc<MetricsRegistry>) -> Self {
        Self { config, buckets: Mutex::new(std::collections::HashMap::new()), metrics }
    }

    /// Attempts to consume one token for `client`. Returns `true` if the
    /// request is allowed, `false` (and increments `rate_limited`) if the
    /// bucket is empty.
    pub fn check(&self, client: IpAddr) -> bool {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: IpAddr, now: Instant) -> bool {
        let mut buckets = self.buckets.lock();
        self.reap(&mut buckets, now);

        let bucket = buckets.entry(client).or_insert_with(|| Bucket {
            tokens: self.config.burst as f64,
            last_refill: now,
            last_used: now,
        });

        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.config.refill_per_second()).min(self.config.burst as f64);
        bucket.last_refill = now;
        bucket.last_used = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            self.metrics.increment_rate_limited();
            false
        }
    }

    fn reap(&self, buckets: &mut std::collections::HashMap<IpAddr, Bucket>, now: Instant) {
        let reap_after = self.config.reap_after();
        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_used) < reap_after);
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(burst: u32, rate_per_minute: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig { burst, rate_per_minute }, Arc::new(MetricsRegistry::new("test")))
    }

    #[test]
    fn allows_up_to_burst_then_blocks() {
        let rl = limiter(5, 60);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        let now = Instant::now();
        for _ in 0..5 {
            assert!(rl.check_at(ip, now));
        }
        assert!(!rl.check_at(ip, now));
    }

    #[test]
    fn refills_over_time() {
        let rl = limiter(1, 60); // 1 token/sec
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        let t0 = Instant::now();
        assert!(rl.check_at(ip, t0));
        assert!(!rl.check_at(ip, t0));
        let t1 = t0 + Duration::from_secs(1);
        assert!(rl.check_at(ip, t1));
    }

    #[test]
    fn different_ips_have_independent_buckets() {
        let rl = limiter(1, 60);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();
        let now = Instant::now();
        assert!(rl.check_at(a, now));
        assert!(rl.check_at(b, now));
        assert!(!rl.check_at(a, now));
    }

    #[test]
    fn idle_buckets_are_reaped() {
        let rl = limiter(1, 60);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        let now = Instant::now();
        assert!(rl.check_at(ip, now));
        assert_eq!(rl.bucket_count(), 1);
        let later = now + rl.config.reap_after() + Duration::from_secs(1);
        rl.check_at("10.0.0.2".parse().unwrap(), later);
        assert_eq!(rl.bucket_count(), 1); // old one reaped, new one inserted
    }

    #[test]
    fn six_requests_at_burst_five_rejects_the_sixth() {
        let rl = limiter(5, 60);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        let now = Instant::now();
        let results: Vec<bool> = (0..6).map(|_| rl.check_at(ip, now)).collect();
        assert_eq!(results, vec![true, true, true, true, true, false]);
    }
}
