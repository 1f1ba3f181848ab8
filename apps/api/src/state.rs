use crate::config::Config;
use crate::extraction::extractor::ResumeExtractor;
use crate::matching::scorer::SimilarityScorer;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every backend inside is constructed once at startup and read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Normalizes and embeds text; backend chosen by `EMBEDDING_PROVIDER`.
    pub scorer: SimilarityScorer,
    pub extractor: ResumeExtractor,
}
