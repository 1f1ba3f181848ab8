use axum::{
    extract::{multipart::MultipartRejection, Multipart},
    Json,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, warn};

use crate::interview::analyzer::{analyze_with, BodyLanguageAnalysis};
use crate::upload::read_upload;

#[derive(Debug, Serialize)]
pub struct AnalyzeBodyLanguageResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<BodyLanguageAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalyzeBodyLanguageResponse {
    fn ok(analysis: BodyLanguageAnalysis) -> Self {
        Self {
            success: true,
            analysis: Some(analysis),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            analysis: None,
            error: Some(error.into()),
        }
    }
}

/// POST /analyze_body_language
///
/// Always answers 200; failures come back as `{success: false, error}`.
/// The uploaded media is read but never inspected.
pub async fn handle_analyze_body_language(
    multipart: Result<Multipart, MultipartRejection>,
) -> Json<AnalyzeBodyLanguageResponse> {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            warn!("Body-language request rejected: {rejection}");
            return Json(AnalyzeBodyLanguageResponse::failed(rejection.body_text()));
        }
    };

    let upload = match read_upload(&mut multipart, &["video", "file"], |_| Ok(())).await {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            return Json(AnalyzeBodyLanguageResponse::failed(
                "No video uploaded (expected field 'video')",
            ))
        }
        Err(e) => {
            warn!("Body-language upload failed: {e}");
            return Json(AnalyzeBodyLanguageResponse::failed(e.to_string()));
        }
    };

    info!(
        filename = %upload.filename,
        content_type = ?upload.content_type,
        bytes = upload.data.len(),
        "Simulating body-language analysis"
    );

    let analysis = analyze_with(&mut StdRng::from_entropy());
    Json(AnalyzeBodyLanguageResponse::ok(analysis))
}
