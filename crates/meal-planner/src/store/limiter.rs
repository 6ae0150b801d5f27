//! Request Budget
//!
//! Token bucket shared by every caller of the Anytype API in the process.
//! The lock is only held to update the counter, never across an await.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Burst capacity of the Anytype local API
pub const ANYTYPE_BURST: u32 = 60;

/// Sustained requests per second of the Anytype local API
pub const ANYTYPE_REFILL_PER_SEC: f64 = 1.0;

/// Upper bound on a single wait hint
const MAX_WAIT: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Start full: `burst` immediate requests, then `refill_per_sec`
    ///
    /// A rate that is not a positive finite number falls back to
    /// [`ANYTYPE_REFILL_PER_SEC`].
    pub fn new(burst: u32, refill_per_sec: f64) -> Self {
        let capacity = f64::from(burst.max(1));
        let refill_per_sec = if refill_per_sec.is_finite() && refill_per_sec > 0.0 {
            refill_per_sec
        } else {
            tracing::warn!(refill_per_sec, "Invalid refill rate, using the default");
            ANYTYPE_REFILL_PER_SEC
        };
        Self {
            capacity,
            refill_per_sec,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Limits of the Anytype local API: burst 60, 1 request/s sustained
    pub fn anytype_default() -> Self {
        Self::new(ANYTYPE_BURST, ANYTYPE_REFILL_PER_SEC)
    }

    /// Take a token if one is available, otherwise report how long until one is
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        self.refill(&mut bucket);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            let missing = 1.0 - bucket.tokens;
            let wait = Duration::try_from_secs_f64(missing / self.refill_per_sec).unwrap_or(MAX_WAIT);
            Err(wait.min(MAX_WAIT))
        }
    }

    /// Wait cooperatively until a token is available, then take it
    pub async fn acquire(&self) {
        loop {
            match self.try_acquire() {
                Ok(()) => return,
                Err(wait) => {
                    tracing::warn!(wait_ms = wait.as_millis() as u64, "Request budget exhausted, waiting");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Whole tokens currently available
    pub fn available(&self) -> u32 {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        self.refill(&mut bucket);
        bucket.tokens.floor() as u32
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        bucket.last_refill = now;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::anytype_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_burst_does_not_block() {
        let limiter = RateLimiter::anytype_default();
        let start = Instant::now();

        for _ in 0..60 {
            limiter.acquire().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.available(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_after_burst_waits_for_refill() {
        let limiter = RateLimiter::anytype_default();
        for _ in 0..60 {
            limiter.acquire().await;
        }

        let start = Instant::now();
        limiter.acquire().await;
        let waited = start.elapsed();

        assert!(waited >= Duration::from_millis(990), "waited {waited:?}");
        assert!(waited < Duration::from_millis(1100), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_is_capped_at_burst() {
        let limiter = RateLimiter::new(3, 1.0);
        for _ in 0..3 {
            assert!(limiter.try_acquire().is_ok());
        }
        assert!(limiter.try_acquire().is_err());

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(limiter.available(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_between_tasks() {
        let limiter = Arc::new(RateLimiter::new(2, 1.0));
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // 2 from the burst, 2 more at 1/s
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_wait_hint() {
        let limiter = RateLimiter::new(1, 2.0);
        assert!(limiter.try_acquire().is_ok());
        let wait = limiter.try_acquire().unwrap_err();
        assert!(wait <= Duration::from_millis(500));
    }

    #[test]
    fn test_invalid_refill_rate_falls_back() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let limiter = RateLimiter::new(1, rate);
            assert!(limiter.try_acquire().is_ok());
            let wait = limiter.try_acquire().unwrap_err();
            assert!(wait > Duration::ZERO, "rate {rate}");
            assert!(wait <= Duration::from_secs(1), "rate {rate}");
        }
    }

    #[test]
    fn test_wait_hint_is_bounded() {
        let limiter = RateLimiter::new(1, 1e-9);
        assert!(limiter.try_acquire().is_ok());
        assert_eq!(limiter.try_acquire().unwrap_err(), MAX_WAIT);
    }
}
