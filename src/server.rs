/// HTTP server setup and routing
use crate::{
    context::AppContext,
    error::{SiteError, SiteResult, StatusResponse},
    geo::geo_gate,
    site::{self, assets},
};
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::info;

/// Build the main application router
///
/// The geo gate wraps every route, including the fallback, so it runs
/// before any handler.
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .merge(site::routes(&ctx))
        .nest_service("/static", assets::service(&ctx.config.service.static_dir))
        .fallback(not_found)
        // Provide state - converts Router<AppContext> to Router<()>
        .with_state(ctx.clone())
        .layer(middleware::from_fn(assets::long_cache_headers))
        .layer(middleware::from_fn_with_state(ctx.gate.clone(), geo_gate))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Health check handler
async fn health_check(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "cache": ctx.cache.name(),
    }))
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<StatusResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(StatusResponse::error("Page not found")),
    )
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> SiteResult<()> {
    let addr = ctx.listen_addr();

    info!("Site listening on {}", addr);
    info!(
        "   Geo gate: {} (blocked: {}, fallback: {})",
        if ctx.config.geo.enabled { "on" } else { "off" },
        ctx.config.geo.blocked_country,
        ctx.config.geo.redirect_path
    );

    let app = build_router(ctx);

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SiteError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    // Peer addresses feed the client IP fallback
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| SiteError::Internal(format!("Server error: {}", e)))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install shutdown handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use axum::body::Body;
    use axum::http::header;
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn test_app(endpoint: &str, template_dir: &std::path::Path) -> Router {
        let mut config = test_config();
        config.geo.api_endpoint = endpoint.to_string();
        config.service.template_dir = template_dir.to_path_buf();
        build_router(AppContext::new(config).await.unwrap())
    }

    fn get_request(uri: &str, forwarded_for: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri(uri)
            .header("x-forwarded-for", forwarded_for)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_blocked_visitor_reaches_fallback_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "country": { "iso_code": "IN" } })),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pricing.html"), "pricing").unwrap();
        std::fs::write(dir.path().join("sorry.html"), "sorry").unwrap();
        let app = test_app(&server.uri(), dir.path()).await;

        let response = app
            .clone()
            .oneshot(get_request("/pricing", "203.0.113.5"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = response.headers().get(header::LOCATION).unwrap().to_str().unwrap().to_string();
        assert_eq!(location, "/sorry-not-available");

        let response = app
            .oneshot(get_request(&location, "203.0.113.5"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_gated_then_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "country": { "iso_code": "US" } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&server.uri(), dir.path()).await;

        let response = app
            .oneshot(get_request("/nope", "198.51.100.3"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_is_not_gated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&server.uri(), dir.path()).await;

        let response = app
            .oneshot(get_request("/health", "203.0.113.5"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
