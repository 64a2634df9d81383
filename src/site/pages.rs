/// Marketing pages and legacy `.html` redirects
use crate::{
    context::AppContext,
    error::{SiteError, SiteResult},
};
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};

/// Pages served at `/<name>` from `<name>.html`
pub const PAGES: &[&str] = &[
    "about",
    "pricing",
    "payment",
    "forex",
    "commodities",
    "crypto",
    "loss-recovery",
    "free-trial",
    "blog",
    "blog-post",
];

/// Template for the geo-blocking fallback page
pub const SORRY_TEMPLATE: &str = "sorry.html";

/// Build page routes
pub fn routes(redirect_path: &str) -> Router<AppContext> {
    let mut router = Router::new()
        .route("/", get(index))
        .route("/index.html", get(index_redirect))
        .route(redirect_path, get(sorry));

    for &page in PAGES {
        router = router
            .route(
                &format!("/{}", page),
                get(move |State(ctx): State<AppContext>| async move {
                    render(&ctx, &format!("{}.html", page)).await
                }),
            )
            .route(
                &format!("/{}.html", page),
                get(move || async move { moved_permanently(&format!("/{}", page)) }),
            );
    }

    router
}

async fn index(State(ctx): State<AppContext>) -> SiteResult<Html<String>> {
    render(&ctx, "index.html").await
}

async fn sorry(State(ctx): State<AppContext>) -> SiteResult<Html<String>> {
    render(&ctx, SORRY_TEMPLATE).await
}

/// `/index.html?x` → `/?x`
async fn index_redirect(uri: Uri) -> Response {
    let target = match uri.query() {
        Some(query) => format!("/?{}", query),
        None => "/".to_string(),
    };
    moved_permanently(&target)
}

/// 301, as the legacy URLs have always answered
fn moved_permanently(target: &str) -> Response {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, target.to_string())]).into_response()
}

/// Serve a pre-built page from the template directory
async fn render(ctx: &AppContext, template: &str) -> SiteResult<Html<String>> {
    let path = ctx.config.service.template_dir.join(template);

    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Ok(Html(html)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Template missing: {}", path.display());
            Err(SiteError::NotFound(format!("Page {} not found", template)))
        }
        Err(e) => Err(e.into()),
    }
}
