/// sitemap.xml
use crate::context::AppContext;
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{NaiveDate, Utc};

/// (path, changefreq, priority)
const SITEMAP_ENTRIES: &[(&str, &str, f32)] = &[
    ("/", "weekly", 1.0),
    ("/about", "monthly", 0.8),
    ("/pricing", "monthly", 0.9),
    ("/payment", "yearly", 0.5),
    ("/forex", "monthly", 0.7),
    ("/commodities", "monthly", 0.7),
    ("/crypto", "monthly", 0.7),
    ("/loss-recovery", "monthly", 0.9),
    ("/free-trial", "weekly", 0.9),
    ("/blog", "weekly", 0.9),
    ("/blog-post", "daily", 0.7),
];

pub fn routes() -> Router<AppContext> {
    Router::new().route("/sitemap.xml", get(sitemap))
}

async fn sitemap(State(ctx): State<AppContext>) -> impl IntoResponse {
    let xml = build_sitemap(&ctx.config.service.base_url, Utc::now().date_naive());
    ([(header::CONTENT_TYPE, "application/xml")], xml)
}

/// Render the sitemap; every entry shares `last_mod`
pub fn build_sitemap(base_url: &str, last_mod: NaiveDate) -> String {
    let last_mod = last_mod.format("%Y-%m-%d").to_string();

    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    for (path, change_freq, priority) in SITEMAP_ENTRIES {
        xml.push_str(&format!(
            "  <url>\n    <loc>{}{}</loc>\n    <lastmod>{}</lastmod>\n    <changefreq>{}</changefreq>\n    <priority>{:.1}</priority>\n  </url>\n",
            base_url, path, last_mod, change_freq, priority
        ));
    }

    xml.push_str("</urlset>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::pages::PAGES;

    #[test]
    fn test_sitemap_lists_every_page() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let xml = build_sitemap("https://example.test", date);

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<loc>https://example.test/</loc>"));
        for page in PAGES {
            assert!(
                xml.contains(&format!("<loc>https://example.test/{}</loc>", page)),
                "missing {}",
                page
            );
        }
        assert_eq!(xml.matches("<lastmod>2024-05-01</lastmod>").count(), SITEMAP_ENTRIES.len());
        assert!(xml.ends_with("</urlset>"));
    }

    #[test]
    fn test_sitemap_priorities() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let xml = build_sitemap("https://example.test", date);

        assert!(xml.contains("<priority>1.0</priority>"));
        assert!(xml.contains("<changefreq>daily</changefreq>"));
    }
}
