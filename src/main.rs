use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod crypto;
mod db;
mod error;
mod game;
mod models;
mod services;

use config::Config;
use constants::API_VERSION;
use db::{Database, FarmStore};
use services::autosave::AutosaveService;
use services::captcha::RecaptchaClient;
use services::chain::{ChainReader, EthersChainReader};
use services::migration::HttpMigrationSource;
use services::session::SessionService;
use services::settlement::SettlementService;
use services::signer::RemoteSigner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sunseed_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting Sunseed session engine");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);

    // Initialize database
    let db = Database::new(&config).await?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db.run_migrations().await?;

    // External collaborators
    let store: Arc<dyn FarmStore> = Arc::new(db.clone());
    let chain: Arc<dyn ChainReader> = Arc::new(EthersChainReader::from_config(&config)?);
    let signer = Arc::new(RemoteSigner::from_config(&config));
    let captcha = Arc::new(RecaptchaClient::from_config(&config));
    let migrations = Arc::new(HttpMigrationSource::from_config(&config));

    let app_state = api::AppState {
        config: config.clone(),
        sessions: Arc::new(SessionService::new(
            store.clone(),
            chain.clone(),
            migrations,
        )),
        autosave: Arc::new(AutosaveService::new(store.clone(), captcha)),
        settlement: Arc::new(SettlementService::new(store, chain, signer)),
    };

    // Build router
    let app = build_router(app_state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid address");

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Session reconciliation
        .route("/api/v1/session/start", post(api::session::start_session))
        // Action replay
        .route("/api/v1/autosave", post(api::autosave::autosave))
        // Settlement
        .route("/api/v1/sync", post(api::settlement::sync))
        .route("/api/v1/withdraw", post(api::settlement::withdraw))
        .route("/api/v1/mint", post(api::settlement::mint))
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
