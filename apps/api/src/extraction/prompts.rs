// Resume extraction LLM prompt templates.

use crate::extraction::schema::FieldSpec;
use crate::llm_client::prompts::NO_INVENTION_INSTRUCTION;

pub const RESUME_EXTRACT_PROMPT: &str = r#"Extract structured information from the resume below.

Return ONE JSON object with exactly these fields:
{fields}

{no_invention}
Dates stay as written in the resume (e.g. "Jan 2021", "2019", "Present").

RESUME TEXT:
{resume_text}"#;

/// Builds the extraction instruction, listing every field and its shape.
pub fn build_extraction_prompt(resume_text: &str, fields: &[FieldSpec]) -> String {
    let field_list = fields
        .iter()
        .map(|f| format!("- \"{}\": {}", f.name, f.shape))
        .collect::<Vec<_>>()
        .join("\n");

    RESUME_EXTRACT_PROMPT
        .replace("{fields}", &field_list)
        .replace("{no_invention}", NO_INVENTION_INSTRUCTION.trim())
        .replace("{resume_text}", resume_text)
}
