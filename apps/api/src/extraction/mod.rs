// Resume extraction: PDF text → LLM → resilient JSON recovery → backfilled record.
// All LLM calls go through llm_client.

pub mod extractor;
pub mod handlers;
pub mod pdf;
pub mod prompts;
pub mod recovery;
pub mod schema;
