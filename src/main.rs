use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use awardnight::{catalog, config::AppConfig, state::AppState};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "awardnight=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting awardnight...");

    let config = AppConfig::from_env();

    let awards = match catalog::load_catalog(&config.catalog_path) {
        Ok(awards) => {
            tracing::info!("Loaded {} award(s) from catalog", awards.len());
            awards
        }
        Err(e) => {
            tracing::warn!("Failed to load award catalog: {}. Serving an empty one.", e);
            Vec::new()
        }
    };

    let mut state = AppState::with_catalog(awards).with_outbound_buffer(config.outbound_buffer);
    if let Some(path) = config.snapshot_path() {
        match state.load_from(&path).await {
            Ok(true) => tracing::info!("Restored state from {}", path.display()),
            Ok(false) => tracing::info!("No snapshot at {}, starting fresh", path.display()),
            Err(e) => tracing::warn!("Ignoring unreadable snapshot {}: {}", path.display(), e),
        }
        state = state.with_snapshot_path(path);
    }
    let state = Arc::new(state);

    let app = awardnight::app(state, &config.static_dir);

    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.bind, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on http://{}", config.bind);
    tracing::info!("Guests: http://{}/home/guest.html", config.bind);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
