//! Resume vs job description similarity on a 0 to 100 scale.
//!
//! Both texts go through the normalizer, get embedded, and the cosine similarity is
//! scaled by 100, clamped to `[0, 100]` and rounded to two decimals. If either side
//! normalizes to an empty string the pair scores `0.0` and the embedder is not called.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::matching::embedder::{Embedder, EmbedderError, Embedding};
use crate::text::normalize;

/// Score reported when either text has no content left after normalization.
pub const DEGENERATE_SCORE: f64 = 0.0;

/// Largest number of texts handed to the embedder in one call. Bounds the padded
/// batch a local encoder has to hold in memory.
pub const EMBED_BATCH_SIZE: usize = 32;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedderError),

    #[error("similarity scoring timed out after {0:?}")]
    Timeout(Duration),

    #[error("normalization task failed: {0}")]
    Worker(String),

    #[error("embedder returned {got} vectors for {expected} inputs")]
    Mismatch { expected: usize, got: usize },
}

#[derive(Clone)]
pub struct SimilarityScorer {
    embedder: Arc<dyn Embedder>,
    timeout: Duration,
}

impl SimilarityScorer {
    pub fn new(embedder: Arc<dyn Embedder>, timeout: Duration) -> Self {
        Self { embedder, timeout }
    }

    /// Scores one resume against one job description.
    pub async fn score(&self, resume_text: &str, jd_text: &str) -> Result<f64, ScoringError> {
        let scores = self
            .score_many(resume_text, std::slice::from_ref(&jd_text.to_string()))
            .await?;
        Ok(scores.first().copied().unwrap_or(DEGENERATE_SCORE))
    }

    /// Scores one resume against each job description, preserving input order.
    /// The resume is normalized and embedded once.
    pub async fn score_many(
        &self,
        resume_text: &str,
        jd_texts: &[String],
    ) -> Result<Vec<f64>, ScoringError> {
        tokio::time::timeout(self.timeout, self.score_many_inner(resume_text, jd_texts))
            .await
            .map_err(|_| ScoringError::Timeout(self.timeout))?
    }

    async fn score_many_inner(
        &self,
        resume_text: &str,
        jd_texts: &[String],
    ) -> Result<Vec<f64>, ScoringError> {
        let mut raw = Vec::with_capacity(jd_texts.len() + 1);
        raw.push(resume_text.to_string());
        raw.extend(jd_texts.iter().cloned());

        let normalized = tokio::task::spawn_blocking(move || {
            raw.iter().map(|t| normalize(t)).collect::<Vec<_>>()
        })
        .await
        .map_err(|e| ScoringError::Worker(e.to_string()))?;

        let (resume_norm, jd_norms) = normalized
            .split_first()
            .ok_or_else(|| ScoringError::Worker("normalization produced no output".to_string()))?;

        let mut scores = vec![DEGENERATE_SCORE; jd_norms.len()];
        if resume_norm.is_empty() {
            debug!("Resume normalized to empty text; all scores are {DEGENERATE_SCORE}");
            return Ok(scores);
        }

        let scorable: Vec<usize> = jd_norms
            .iter()
            .enumerate()
            .filter(|(_, jd)| !jd.is_empty())
            .map(|(i, _)| i)
            .collect();
        if scorable.is_empty() {
            return Ok(scores);
        }

        let mut batch = Vec::with_capacity(scorable.len() + 1);
        batch.push(resume_norm.clone());
        batch.extend(scorable.iter().map(|&i| jd_norms[i].clone()));

        let embeddings = self.embed_in_chunks(&batch).await?;

        let (resume_embedding, jd_embeddings) = embeddings
            .split_first()
            .ok_or(ScoringError::Mismatch {
                expected: batch.len(),
                got: 0,
            })?;
        for (&slot, jd_embedding) in scorable.iter().zip(jd_embeddings) {
            scores[slot] = to_score(resume_embedding, jd_embedding);
        }

        Ok(scores)
    }

    /// Embeds `texts` at most `EMBED_BATCH_SIZE` at a time, keeping input order.
    async fn embed_in_chunks(&self, texts: &[String]) -> Result<Vec<Embedding>, ScoringError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(EMBED_BATCH_SIZE) {
            let chunk_embeddings = self.embedder.embed_batch(chunk).await?;
            if chunk_embeddings.len() != chunk.len() {
                return Err(ScoringError::Mismatch {
                    expected: chunk.len(),
                    got: chunk_embeddings.len(),
                });
            }
            embeddings.extend(chunk_embeddings);
        }
        Ok(embeddings)
    }
}

/// Cosine similarity scaled to `[0, 100]`, rounded to two decimals.
pub fn to_score(a: &Embedding, b: &Embedding) -> f64 {
    let similarity = f64::from(a.cosine_similarity(b));
    let scaled = (similarity * 100.0).clamp(0.0, 100.0);
    (scaled * 100.0).round() / 100.0
}
