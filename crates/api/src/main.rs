//! Oxgate API server binary.
//!
//! Serves the identity and catalog-proxy API over HTTP. Configuration is
//! read from the environment (see [`oxgate_api::config::ApiConfig`]);
//! when `OXGATE_DATABASE_URL` is unset the server falls back to an
//! in-memory store, which is only suitable for local development.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use oxgate_api::config::ApiConfig;
use oxgate_api::ox::OxClient;
use oxgate_api::routes;
use oxgate_api::state::AppState;
use oxgate_api::store::{self, AuthStore, MemoryStore, PgStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env if present; ignored in production where env vars are set directly
    let _ = dotenvy::dotenv();

    // Initialize tracing with EnvFilter
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "oxgate_api=info,tower_http=debug".into());

    // Use JSON format on Fly.io for structured log parsing, text format locally
    let is_fly = std::env::var("FLY_APP_NAME").is_ok();
    let json_layer = is_fly.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_fly).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    let config = ApiConfig::from_env().expect("Failed to load configuration");

    let auth_store: Arc<dyn AuthStore> = match &config.database_url {
        Some(url) => {
            let pool = store::create_pool(url)
                .await
                .expect("Failed to create database pool");
            tracing::info!("Database pool created");

            // NOTE: Migrations are NOT run automatically on startup.
            // Run them explicitly via: cargo run -p oxgate-cli -- migrate
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!(
                "OXGATE_DATABASE_URL not set, using in-memory store; all data is lost on restart"
            );
            Arc::new(MemoryStore::new())
        }
    };

    let tenant_api = Arc::new(OxClient::new(&config.ox));

    let state = AppState::new(config.clone(), auth_store, tenant_api);
    let app = routes::app(state);

    let addr = config.socket_addr();
    tracing::info!("oxgate-api listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
