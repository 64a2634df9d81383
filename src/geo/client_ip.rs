/// Client address extraction
///
/// `X-Forwarded-For` is taken at face value: any client can set it, so the
/// gate is only as strong as the proxy in front of the site. The trusted
/// proxy list only decides whether a peer may supply `X-Real-IP`.
use axum::http::HeaderMap;
use ipnet::IpNet;
use std::net::{IpAddr, SocketAddr};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";

/// Address extraction policy
#[derive(Debug, Clone, Default)]
pub struct ClientIpPolicy {
    trusted_proxies: Vec<IpNet>,
}

impl ClientIpPolicy {
    pub fn new(trusted_proxies: Vec<IpNet>) -> Self {
        Self { trusted_proxies }
    }

    /// Extract the client address, first match wins:
    /// 1. first `X-Forwarded-For` entry
    /// 2. `X-Real-IP`, when the peer is a trusted proxy
    /// 3. the peer address
    ///
    /// Returns an empty string when there is no signal at all.
    pub fn extract(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        if let Some(forwarded) = forwarded_for(headers) {
            return forwarded;
        }

        let Some(peer) = peer else {
            return String::new();
        };

        if self.is_trusted(peer.ip()) {
            if let Some(real_ip) = header_str(headers, X_REAL_IP) {
                return real_ip.to_string();
            }
        }

        peer.ip().to_string()
    }

    fn is_trusted(&self, ip: IpAddr) -> bool {
        self.trusted_proxies.iter().any(|net| net.contains(&ip))
    }
}

/// First comma-separated entry of `X-Forwarded-For`, trimmed
pub fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    header_str(headers, X_FORWARDED_FOR)
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        // ", 1.2.3.4" has an empty first entry; use the next source, not ""
        .filter(|first| !first.is_empty())
        .map(str::to_string)
}

/// Non-empty, trimmed header value
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
