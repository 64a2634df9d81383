/// Geo-blocking
///
/// - `client_ip`: which address a request comes from
/// - `resolver`: address to country, cache first
/// - `gate`: middleware applying the blocking policy
pub mod client_ip;
pub mod gate;
pub mod resolver;

pub use client_ip::ClientIpPolicy;
pub use gate::{geo_gate, GateDecision, GeoGate};
pub use resolver::{GeoResolver, GeoResolverConfig};
