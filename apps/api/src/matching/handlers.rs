//! Axum route handlers for resume ↔ job description matching.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;

/// Most job descriptions accepted in one `/match` request.
pub const MAX_JOB_DESCRIPTIONS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    #[serde(default)]
    pub resume: String,
    #[serde(default)]
    pub job_descriptions: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MatchResult {
    /// 1-based position of the job description in the request.
    pub job_id: usize,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub results: Vec<MatchResult>,
}

impl MatchRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.resume.trim().is_empty() {
            return Err(AppError::Validation("resume is required".to_string()));
        }
        if self.job_descriptions.is_empty() {
            return Err(AppError::Validation(
                "job_descriptions must contain at least one entry".to_string(),
            ));
        }
        if self.job_descriptions.len() > MAX_JOB_DESCRIPTIONS {
            return Err(AppError::Validation(format!(
                "job_descriptions may contain at most {MAX_JOB_DESCRIPTIONS} entries"
            )));
        }
        Ok(())
    }
}

/// POST /match
///
/// Scores the resume against every job description, in request order.
pub async fn handle_match(
    State(state): State<AppState>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<MatchResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    request.validate()?;

    let scores = state
        .scorer
        .score_many(&request.resume, &request.job_descriptions)
        .await?;

    info!(jobs = scores.len(), "Scored resume against job descriptions");

    let results = scores
        .into_iter()
        .enumerate()
        .map(|(idx, score)| MatchResult {
            job_id: idx + 1,
            score,
        })
        .collect();

    Ok(Json(MatchResponse { results }))
}
