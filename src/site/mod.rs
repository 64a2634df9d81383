/// Site routes and handlers
pub mod assets;
pub mod debug;
pub mod forms;
pub mod pages;
pub mod sitemap;

use crate::context::AppContext;
use axum::Router;

/// Build site routes
pub fn routes(ctx: &AppContext) -> Router<AppContext> {
    let router = Router::new()
        .merge(pages::routes(&ctx.config.geo.redirect_path))
        .merge(forms::routes())
        .merge(sitemap::routes());

    if ctx.config.service.debug_endpoints {
        router.merge(debug::routes())
    } else {
        router
    }
}

/// Whether `path` is already served by a fixed route, or would be read by
/// the router as a capture
pub fn is_reserved_path(path: &str) -> bool {
    const FIXED: &[&str] = &[
        "/",
        "/index.html",
        "/health",
        "/sitemap.xml",
        "/contact-submit",
        "/loss-recovery-submit",
        "/debug/ip",
    ];

    if FIXED.contains(&path) || path == "/static" || path.starts_with("/static/") {
        return true;
    }
    if path.contains(':') || path.contains('*') {
        return true;
    }

    let name = path.trim_start_matches('/');
    let name = name.strip_suffix(".html").unwrap_or(name);
    pages::PAGES.contains(&name)
}
