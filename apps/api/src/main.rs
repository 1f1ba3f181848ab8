mod config;
mod errors;
mod extraction;
mod interview;
mod llm_client;
mod matching;
mod routes;
mod state;
mod text;
mod upload;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extraction::extractor::ResumeExtractor;
use crate::llm_client::LlmClient;
use crate::matching::build_embedder;
use crate::matching::scorer::SimilarityScorer;
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
                "{}={},tower_http={}",
                env!("CARGO_PKG_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HirePrep API v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {config:?}");

    // Initialize LLM client
    let llm = LlmClient::from_config(&config).context("failed to build LLM client")?;
    info!("LLM client initialized (model: {})", llm.model());

    // Load the embedding backend once; requests share it read-only
    let embedder = build_embedder(&config)
        .await
        .context("failed to initialize embedding backend")?;
    info!(
        "Embedding backend ready ({})",
        config.embedding_provider.as_str()
    );

    let scorer = SimilarityScorer::new(
        embedder,
        Duration::from_secs(config.scoring_timeout_secs),
    );
    let extractor = ResumeExtractor::new(Arc::new(llm));

    warn!("/analyze_body_language returns simulated scores; uploaded media is not analysed");

    let cors = cors_layer(&config.allowed_origins)?;

    let state = AppState {
        config: config.clone(),
        scorer,
        extractor,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// CORS restricted to the configured origin allow-list.
fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin '{o}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any))
}
