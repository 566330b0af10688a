mod config;
mod db;
mod errors;
mod features;
mod models;
mod ranking;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::ranking::lock::AuditLock;
use crate::ranking::model::load_scoring_model;
use crate::ranking::service::RankingService;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::postgres::PgRankingStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting candidate ranking service v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgRankingStore::new(db));

    // Initialize Redis (bias audit locks)
    let redis = redis::Client::open(config.redis_url.clone())?;
    let audit_lock = AuditLock::new(redis, Duration::from_secs(config.audit_lock_ttl_secs));
    info!("Redis client initialized");

    // Load the scoring model; a missing or malformed artifact aborts startup
    let model = load_scoring_model(&config.model_source).await?;
    info!("Scoring model backend: {}", model.backend());

    info!(
        "Bias audit: min sample {}, threshold {}",
        config.bias.min_sample_size, config.bias.threshold
    );

    let state = AppState {
        ranking: RankingService::new(store, model),
        audit_lock,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
