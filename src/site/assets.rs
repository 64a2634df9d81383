/// Static assets
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use std::path::Path;
use tower_http::services::ServeDir;

const LONG_CACHE: &str = "public, max-age=31536000";
const LONG_CACHE_EXTENSIONS: &[&str] = &["js", "css", "png", "jpg", "jpeg", "gif", "svg", "webp"];

/// File service mounted at `/static`
pub fn service(static_dir: &Path) -> ServeDir {
    ServeDir::new(static_dir)
}

/// Year-long caching for scripts, styles and images
pub async fn long_cache_headers(req: Request, next: Next) -> Response {
    let cacheable = req.method() == Method::GET && is_long_cached(req.uri().path());

    let mut response = next.run(req).await;
    if cacheable {
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static(LONG_CACHE));
    }
    response
}

fn is_long_cached(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            LONG_CACHE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
