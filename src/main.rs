/// GeoGate - marketing site with country-based access gating
///
/// Serves the FxOpus pages, relays contact forms to email, and turns away
/// visitors from the blocked country before any handler runs.

mod cache;
mod config;
mod context;
mod error;
mod geo;
mod mailer;
mod rate_limit;
mod server;
mod site;

use config::{LoggingConfig, ServerConfig};
use context::AppContext;
use error::SiteResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> SiteResult<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize logging
    init_tracing(&config.logging);

    // Print banner
    print_banner();

    // Create application context
    let ctx = AppContext::new(config).await?;

    if ctx.mailer.is_configured() {
        tracing::info!("Email relay enabled");
    } else {
        tracing::warn!("Email relay disabled, form submissions will fail");
    }

    // Start server
    server::serve(ctx).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level)
        .unwrap_or_else(|_| "geogate=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn print_banner() {
    println!(
        r#"
   ______           ______      __
  / ____/__  ____  / ____/___ _/ /____
 / / __/ _ \/ __ \/ / __/ __ `/ __/ _ \
/ /_/ /  __/ /_/ / /_/ / /_/ / /_/  __/
\____/\___/\____/\____/\__,_/\__/\___/

        FxOpus site v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
