/// Client address diagnostics
///
/// Shows what the gate sees for the caller. Only mounted when
/// `DEBUG_ENDPOINTS=true`.
use crate::{context::AppContext, geo::ClientIpPolicy};
use axum::{
    extract::{ConnectInfo, Request, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::net::SocketAddr;

pub fn routes() -> Router<AppContext> {
    Router::new().route("/debug/ip", get(debug_ip))
}

async fn debug_ip(State(ctx): State<AppContext>, req: Request) -> Json<Value> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let headers = req.headers();

    let mut all_headers = Map::new();
    for name in headers.keys() {
        let values: Vec<&str> = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        all_headers.insert(name.to_string(), Value::String(values.join(", ")));
    }

    tracing::debug!(headers = ?all_headers, "debug_ip: incoming request headers");

    let policy = ClientIpPolicy::new(ctx.config.geo.trusted_proxies.clone());
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };

    Json(json!({
        "client_ip": policy.extract(headers, peer),
        "remote_addr": peer.map(|p| p.to_string()).unwrap_or_default(),
        "x_forwarded_for": header_value("x-forwarded-for"),
        "x_real_ip": header_value("x-real-ip"),
        "headers": all_headers,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_debug_ip_reports_extracted_address() {
        let ctx = AppContext::new(test_config()).await.unwrap();
        let app = routes().with_state(ctx);

        let mut req = axum::http::Request::builder()
            .uri("/debug/ip")
            .header("x-forwarded-for", "203.0.113.5, 70.41.3.18")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo("10.0.0.1:4000".parse::<SocketAddr>().unwrap()));

        let response = app.oneshot(req).await.unwrap();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(value["client_ip"], "203.0.113.5");
        assert_eq!(value["remote_addr"], "10.0.0.1:4000");
        assert_eq!(value["x_forwarded_for"], "203.0.113.5, 70.41.3.18");
        assert_eq!(value["x_real_ip"], "");
        assert_eq!(value["headers"]["x-forwarded-for"], "203.0.113.5, 70.41.3.18");
    }
}
