use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rss_proxy::config::{Config, CONFIG_FILE};
use rss_proxy::proxy::FeedProxy;
use rss_proxy::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rss_proxy=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env(CONFIG_FILE)?;
    if std::path::Path::new(&config.static_dir).is_dir() {
        info!("Serving static files from '{}'", config.static_dir);
    } else {
        warn!(
            "Static directory '{}' not found; only /api/rss and /health will answer",
            config.static_dir
        );
    }

    let state = Arc::new(AppState {
        proxy: FeedProxy::new()?,
    });

    let app = routes::router(state, &config.static_dir);

    // Start server
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Server starting on http://localhost:{}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
