/// Country resolver - address to ISO country code with caching
use crate::{
    cache::{country_key, Cache},
    config::GeoConfig,
    error::{SiteError, SiteResult},
    rate_limit::LookupLimiter,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Body returned by the geolocation service
#[derive(Debug, Deserialize)]
pub struct GeoApiResponse {
    pub country: GeoApiCountry,
}

#[derive(Debug, Deserialize)]
pub struct GeoApiCountry {
    pub iso_code: String,
}

/// Resolver configuration
#[derive(Debug, Clone)]
pub struct GeoResolverConfig {
    /// Base URL, without trailing slash
    pub api_endpoint: String,
    pub api_token: String,
    pub timeout: Duration,
    /// Lifetime of cached countries
    pub cache_ttl: Duration,
    pub rate_limit_per_second: u32,
    /// Longest a lookup queues for quota before failing
    pub quota_wait: Duration,
    /// User-Agent header for lookups
    pub user_agent: String,
}

impl GeoResolverConfig {
    pub fn new(geo: &GeoConfig, cache_ttl: Duration) -> Self {
        Self {
            api_endpoint: geo.api_endpoint.clone(),
            api_token: geo.api_token.clone(),
            timeout: Duration::from_secs(geo.api_timeout_secs),
            cache_ttl,
            rate_limit_per_second: geo.rate_limit_per_second,
            quota_wait: Duration::from_secs(geo.api_timeout_secs),
            user_agent: format!("geogate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Resolves client addresses to countries, cache first
///
/// Concurrent misses for the same address are not deduplicated; each one
/// performs its own lookup and the last write wins.
pub struct GeoResolver {
    cache: Arc<dyn Cache>,
    http_client: reqwest::Client,
    limiter: LookupLimiter,
    config: GeoResolverConfig,
}

impl GeoResolver {
    /// Create a new resolver
    pub fn new(cache: Arc<dyn Cache>, config: GeoResolverConfig) -> SiteResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| SiteError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let limiter = LookupLimiter::new(config.rate_limit_per_second);

        Ok(Self {
            cache,
            http_client,
            limiter,
            config,
        })
    }

    /// Resolve an address to an uppercase country code
    ///
    /// Resolution order:
    /// 1. Cache lookup (no network, no quota)
    /// 2. One rate-limited GET to the geolocation service, no retry; over
    ///    quota, the lookup waits up to `quota_wait` for its turn
    /// 3. Cache the normalized code for the configured TTL
    ///
    /// Failed lookups are never cached.
    pub async fn resolve_country(&self, address: &str) -> SiteResult<String> {
        let key = country_key(address);

        match self.cache.get(&key).await {
            Ok(Some(code)) => return Ok(code),
            Ok(None) => {}
            Err(e) => {
                warn!(address, error = %e, "Country cache read failed, treating as miss");
            }
        }

        self.limiter.acquire(self.config.quota_wait).await?;

        let code = self.fetch_country(address).await?;

        if let Err(e) = self.cache.set(&key, &code, self.config.cache_ttl).await {
            warn!(address, error = %e, "Failed to cache resolved country");
        }

        Ok(code)
    }

    /// Lookup URL: `<endpoint>/<address>/?token=<token>`
    fn lookup_url(&self, address: &str) -> String {
        format!(
            "{}/{}/?token={}",
            self.config.api_endpoint,
            urlencoding::encode(address),
            urlencoding::encode(&self.config.api_token)
        )
    }

    /// Query the geolocation service
    async fn fetch_country(&self, address: &str) -> SiteResult<String> {
        debug!(address, "Resolving country via geolocation service");

        let response = self
            .http_client
            .get(self.lookup_url(address))
            .send()
            .await
            .map_err(|e| SiteError::Transport(format!("Failed to send lookup request: {}", e)))?;

        if !response.status().is_success() {
            return Err(SiteError::Transport(format!(
                "Geolocation service returned error: {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SiteError::Transport(format!("Failed to read lookup response: {}", e)))?;

        let parsed: GeoApiResponse = serde_json::from_slice(&body)
            .map_err(|e| SiteError::Decode(format!("Invalid lookup response: {}", e)))?;

        Ok(parsed.country.iso_code.trim().to_uppercase())
    }
}
