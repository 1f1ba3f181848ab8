//! Axum route handlers for resume extraction.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::errors::AppError;
use crate::extraction::pdf::{extract_pdf_text, is_pdf_filename};
use crate::state::AppState;
use crate::upload::read_upload;

#[derive(Debug, Serialize)]
pub struct ExtractResumeResponse {
    pub success: bool,
    /// Every `ParsedResume` field, plus any extra keys the model returned.
    pub parsed_resume: Map<String, Value>,
}

/// POST /extract_resume
///
/// Multipart field `file`, PDF only. Either the full record (with defaults
/// backfilled) or an error; never a partial result.
pub async fn handle_extract_resume(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ExtractResumeResponse>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;
    let upload = read_upload(&mut multipart, &["file"], |filename| {
        if is_pdf_filename(filename) {
            Ok(())
        } else {
            Err(AppError::UnsupportedFormat(
                "Only PDF files (.pdf) are supported".to_string(),
            ))
        }
    })
    .await?
    .ok_or_else(|| AppError::Validation("No file uploaded (expected field 'file')".to_string()))?;

    info!(
        filename = %upload.filename,
        bytes = upload.data.len(),
        "Extracting resume from upload"
    );

    let resume_text = extract_pdf_text(upload.data).await?;
    let parsed_resume = state.extractor.extract(&resume_text).await?;

    Ok(Json(ExtractResumeResponse {
        success: true,
        parsed_resume,
    }))
}
