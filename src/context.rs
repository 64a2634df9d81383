/// Application context and dependency injection
use crate::{
    cache::{self, Cache},
    config::ServerConfig,
    error::SiteResult,
    geo::{GeoGate, GeoResolver, GeoResolverConfig},
    mailer::Mailer,
};
use std::sync::Arc;

/// Application context holding all shared services
///
/// Built once, before the listener starts accepting connections.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub cache: Arc<dyn Cache>,
    pub gate: Arc<GeoGate>,
    pub mailer: Arc<Mailer>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> SiteResult<Self> {
        config.validate()?;

        // Country cache shared by every request
        let cache = cache::connect(&config.cache).await?;

        let resolver_config = GeoResolverConfig::new(&config.geo, config.cache.ttl());
        let resolver = Arc::new(GeoResolver::new(cache.clone(), resolver_config)?);

        let gate = Arc::new(GeoGate::new(resolver, &config.geo));

        let mailer = Arc::new(Mailer::new(config.email.clone())?);

        Ok(Self {
            config: Arc::new(config),
            cache,
            gate,
            mailer,
        })
    }

    /// Get listen address
    pub fn listen_addr(&self) -> String {
        format!(
            "{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
