//! Asks the completion service for resume fields
//! and hands the reply to `recovery`.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::extraction::prompts::build_extraction_prompt;
use crate::extraction::recovery::{backfill_items, recover};
use crate::extraction::schema::{item_defaults, required_fields, RESUME_FIELDS};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{CompletionClient, LlmError};

/// Resume text beyond this many characters is not sent to the model.
const MAX_PROMPT_RESUME_CHARS: usize = 30_000;

#[derive(Clone)]
pub struct ResumeExtractor {
    llm: Arc<dyn CompletionClient>,
}

impl ResumeExtractor {
    pub fn new(llm: Arc<dyn CompletionClient>) -> Self {
        Self { llm }
    }

    /// Sends the field schema plus resume text and returns the model's raw reply.
    /// No parsing happens here.
    pub async fn request_fields(&self, resume_text: &str) -> Result<String, LlmError> {
        let prompt_text = truncate_chars(resume_text, MAX_PROMPT_RESUME_CHARS);
        if prompt_text.len() < resume_text.len() {
            warn!(
                "Resume text truncated to {MAX_PROMPT_RESUME_CHARS} characters for extraction"
            );
        }
        let prompt = build_extraction_prompt(prompt_text, RESUME_FIELDS);
        self.llm.complete(JSON_ONLY_SYSTEM, &prompt).await
    }

    /// Full pipeline: prompt the model, recover the JSON, backfill every resume field
    /// and every key of each nested record.
    /// An empty `resumeText` is filled with the document text itself.
    pub async fn extract(&self, resume_text: &str) -> Result<Map<String, Value>, AppError> {
        let reply = self.request_fields(resume_text).await?;
        debug!("Extraction reply: {} chars", reply.len());

        let mut record = recover(&reply, &required_fields())?;
        backfill_items(&mut record, &item_defaults());

        let text_missing = record
            .get("resumeText")
            .and_then(Value::as_str)
            .map_or(true, |t| t.trim().is_empty());
        if text_missing {
            record.insert(
                "resumeText".to_string(),
                Value::String(resume_text.to_string()),
            );
        }

        Ok(record)
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Canned completion clients for tests.
#[cfg(test)]
pub mod fakes {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Replies with a fixed string and records every prompt it receives.
    pub struct CannedCompletion {
        reply: Result<String, String>,
        pub calls: AtomicUsize,
        pub prompts: Mutex<Vec<String>>,
    }

    impl CannedCompletion {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(status: u16, message: &str) -> Self {
            Self {
                reply: Err(format!("{status}:{message}")),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionClient for CannedCompletion {
        async fn complete(&self, _system: &str, prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(encoded) => {
                    let (status, message) = encoded.split_once(':').unwrap();
                    Err(LlmError::Api {
                        status: status.parse().unwrap(),
                        message: message.to_string(),
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::CannedCompletion;
    use super::*;
    use crate::extraction::recovery::ExtractionError;

    #[tokio::test]
    async fn test_extract_backfills_every_resume_field() {
        let llm = Arc::new(CannedCompletion::replying(
            "Sure! {\"skills\": [\"Rust\", \"SQL\"], \"summary\": \"Backend engineer\",}",
        ));
        let extractor = ResumeExtractor::new(llm.clone());

        let record = extractor.extract("Jane Doe\nRust, SQL").await.unwrap();

        for field in RESUME_FIELDS {
            assert!(record.contains_key(field.name), "missing {}", field.name);
        }
        assert_eq!(record["skills"], serde_json::json!(["Rust", "SQL"]));
        assert_eq!(record["summary"], "Backend engineer");
        assert_eq!(record["experience"], serde_json::json!([]));
        assert_eq!(record["resumeText"], "Jane Doe\nRust, SQL");
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_nested_records_get_every_key() {
        let llm = Arc::new(CannedCompletion::replying(
            r#"{"experience":[{"company":"Acme"}],"profileLinks":[{"url":"https://gh.io/x"}]}"#,
        ));
        let record = ResumeExtractor::new(llm).extract("resume").await.unwrap();

        let job = &record["experience"][0];
        assert_eq!(job["company"], "Acme");
        for key in ["position", "startDate", "endDate", "description"] {
            assert_eq!(job[key], "", "{key} missing");
        }
        assert_eq!(
            record["profileLinks"][0],
            serde_json::json!({"platform": "", "url": "https://gh.io/x"})
        );
    }

    #[tokio::test]
    async fn test_model_supplied_resume_text_is_kept() {
        let llm = Arc::new(CannedCompletion::replying(
            r#"{"resumeText": "cleaned text"}"#,
        ));
        let record = ResumeExtractor::new(llm)
            .extract("raw text")
            .await
            .unwrap();
        assert_eq!(record["resumeText"], "cleaned text");
    }

    #[tokio::test]
    async fn test_prompt_contains_schema_and_document() {
        let llm = Arc::new(CannedCompletion::replying("{}"));
        ResumeExtractor::new(llm.clone())
            .request_fields("Jane Doe — Staff Engineer")
            .await
            .unwrap();

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("Jane Doe — Staff Engineer"));
        assert!(prompts[0].contains("\"profileLinks\""));
    }

    #[tokio::test]
    async fn test_reply_without_json_is_extraction_error() {
        let llm = Arc::new(CannedCompletion::replying("I cannot help with that."));
        let err = ResumeExtractor::new(llm).extract("text").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Extraction(ExtractionError::NoJsonObject)
        ));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_upstream_error() {
        let llm = Arc::new(CannedCompletion::failing(503, "overloaded"));
        let err = ResumeExtractor::new(llm).extract("text").await.unwrap_err();
        match err {
            AppError::Upstream(msg) => assert!(msg.contains("overloaded")),
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
