// Resume ↔ job description similarity.
// Normalized text is embedded by a pluggable `Embedder` and compared by cosine similarity.

pub mod candle_embedder;
pub mod embedder;
pub mod handlers;
pub mod openai_embedder;
pub mod scorer;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::{Config, EmbeddingProvider};
use crate::matching::candle_embedder::LocalCandleEmbedder;
use crate::matching::embedder::Embedder;
use crate::matching::openai_embedder::OpenAiEmbedder;

#[derive(Debug, Error)]
pub enum EmbedderFactoryError {
    #[error("missing API key: the openai embedder requires EMBEDDING_API_KEY or LLM_API_KEY")]
    MissingApiKey,
    #[error("model initialization failed: {0}")]
    InitializationFailed(String),
}

/// Builds the embedding backend selected by `EMBEDDING_PROVIDER`.
///
/// Loading the local model downloads weights on first use, so this runs once at
/// startup and the result is shared read-only by every request.
pub async fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>, EmbedderFactoryError> {
    match config.embedding_provider {
        EmbeddingProvider::Local => {
            info!(model = %config.embedding_model, "Loading local Candle embedding model");
            let model_id = config.embedding_model.clone();
            let embedder = tokio::task::spawn_blocking(move || LocalCandleEmbedder::new(&model_id))
                .await
                .map_err(|e| EmbedderFactoryError::InitializationFailed(e.to_string()))?
                .map_err(|e| EmbedderFactoryError::InitializationFailed(e.to_string()))?;
            Ok(Arc::new(embedder))
        }
        EmbeddingProvider::OpenAi => {
            let key = config.embedding_key();
            if key.trim().is_empty() {
                return Err(EmbedderFactoryError::MissingApiKey);
            }
            info!(model = %config.embedding_model, "Using OpenAI-compatible embedding endpoint");
            let embedder = OpenAiEmbedder::new(
                config.embedding_api_url.clone(),
                key.to_string(),
                config.embedding_model.clone(),
            )
            .map_err(|e| EmbedderFactoryError::InitializationFailed(e.to_string()))?;
            Ok(Arc::new(embedder))
        }
    }
}
