/// Geo-blocking gate
///
/// Runs before every route handler. Visitors resolved to the blocked country
/// get a temporary redirect to the fallback page; everyone else, including
/// visitors whose country cannot be resolved, proceeds.
use crate::{
    config::GeoConfig,
    geo::{client_ip::ClientIpPolicy, GeoResolver},
};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of the gate for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Redirect(String),
}

/// Per-request blocking policy
pub struct GeoGate {
    resolver: Arc<GeoResolver>,
    policy: ClientIpPolicy,
    enabled: bool,
    blocked_country: String,
    redirect_path: String,
}

impl GeoGate {
    pub fn new(resolver: Arc<GeoResolver>, config: &GeoConfig) -> Self {
        Self {
            resolver,
            policy: ClientIpPolicy::new(config.trusted_proxies.clone()),
            enabled: config.enabled,
            blocked_country: config.blocked_country.to_uppercase(),
            redirect_path: config.redirect_path.clone(),
        }
    }

    /// Paths that are never gated: the fallback page itself, health checks
    /// and static assets
    fn is_exempt(&self, path: &str) -> bool {
        path == self.redirect_path || path == "/health" || path.starts_with("/static/")
    }

    /// Decide whether a request proceeds
    pub async fn decide(
        &self,
        path: &str,
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
    ) -> GateDecision {
        if !self.enabled || self.is_exempt(path) {
            return GateDecision::Proceed;
        }

        let address = self.policy.extract(headers, peer);
        debug!(
            client_ip = %address,
            remote_addr = ?peer,
            x_forwarded_for = ?headers.get("x-forwarded-for"),
            "geo_gate: detected client address"
        );

        match self.resolver.resolve_country(&address).await {
            Ok(code) if code == self.blocked_country => {
                info!(client_ip = %address, country = %code, "geo_gate: redirecting blocked visitor");
                GateDecision::Redirect(self.redirect_path.clone())
            }
            Ok(code) => {
                debug!(client_ip = %address, country = %code, "geo_gate: allowed");
                GateDecision::Proceed
            }
            Err(e) => {
                // Fail open
                warn!(client_ip = %address, error = %e, "geo_gate: country lookup failed, allowing request");
                GateDecision::Proceed
            }
        }
    }
}

/// Geo-blocking middleware
pub async fn geo_gate(State(gate): State<Arc<GeoGate>>, req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    match gate.decide(req.uri().path(), req.headers(), peer).await {
        GateDecision::Proceed => next.run(req).await,
        GateDecision::Redirect(target) => {
            let mut response = Redirect::temporary(&target).into_response();
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            response
        }
    }
}
