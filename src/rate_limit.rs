/// Outbound rate limiting for the geolocation service
use crate::error::{SiteError, SiteResult};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Duration};

/// Process-wide quota for lookups that miss the cache
#[derive(Clone)]
pub struct LookupLimiter {
    limiter: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl LookupLimiter {
    /// Allow `per_second` lookups per second with an equal burst
    pub fn new(per_second: u32) -> Self {
        let rate = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(rate).allow_burst(rate);

        Self {
            limiter: Arc::new(GovernorLimiter::direct(quota)),
        }
    }

    /// Take one unit of quota, waiting up to `max_wait` for it
    ///
    /// Bursts above the quota queue instead of failing; only a wait longer
    /// than `max_wait` is `RateLimited`.
    pub async fn acquire(&self, max_wait: Duration) -> SiteResult<()> {
        if self.limiter.check().is_ok() {
            return Ok(());
        }

        tokio::time::timeout(max_wait, self.limiter.until_ready())
            .await
            .map_err(|_| SiteError::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    const NO_WAIT: Duration = Duration::from_millis(10);

    #[tokio::test]
    async fn test_limiter_allows_first_request() {
        let limiter = LookupLimiter::new(10);
        assert!(limiter.acquire(NO_WAIT).await.is_ok());
    }

    #[tokio::test]
    async fn test_burst_limit() {
        let limiter = LookupLimiter::new(5);

        for _ in 0..5 {
            assert!(limiter.acquire(NO_WAIT).await.is_ok());
        }

        assert!(matches!(
            limiter.acquire(NO_WAIT).await,
            Err(SiteError::RateLimited)
        ));
    }

    #[tokio::test]
    async fn test_over_burst_waits_for_quota() {
        let limiter = LookupLimiter::new(5);
        for _ in 0..5 {
            limiter.acquire(NO_WAIT).await.unwrap();
        }

        // One cell every 200ms at 5/s
        let started = Instant::now();
        limiter.acquire(Duration::from_secs(2)).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_zero_rate_falls_back_to_one() {
        let limiter = LookupLimiter::new(0);
        assert!(limiter.acquire(NO_WAIT).await.is_ok());
        assert!(limiter.acquire(NO_WAIT).await.is_err());
    }
}
