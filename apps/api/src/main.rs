mod analysis;
mod auth;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod quota;
mod routes;
mod state;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::extractor::ResponseExtractor;
use crate::analysis::invoker::{ModelInvoker, RetryPolicy};
use crate::analysis::pipeline::AnalysisPipeline;
use crate::auth::PgSessionAuthenticator;
use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::llm_client::LlmClient;
use crate::quota::postgres::{PgSubscriptionStore, PgUsageStore};
use crate::quota::QuotaGate;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ATS API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.llm_settings())?;
    info!("LLM client initialized (model: {})", llm.model());

    // Quota gate over usage counters and subscription state
    let quota = Arc::new(QuotaGate::new(
        Arc::new(PgUsageStore::new(db.clone())),
        Arc::new(PgSubscriptionStore::new(db.clone())),
        config.max_free_count,
    ));
    info!("Quota gate initialized (free tier: {} analyses)", config.max_free_count);

    let policy = RetryPolicy::new(config.max_attempts);
    let pipeline = Arc::new(AnalysisPipeline::new(
        ModelInvoker::new(Arc::new(llm), policy),
        quota.clone(),
        ResponseExtractor::new(config.strict_response_shape),
    ));
    info!(
        "Analysis pipeline ready (max attempts: {}, strict shape: {})",
        policy.max_attempts, config.strict_response_shape
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        pipeline,
        quota,
        authenticator: Arc::new(PgSessionAuthenticator::new(db)),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to the dashboard origin once it is configurable

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
