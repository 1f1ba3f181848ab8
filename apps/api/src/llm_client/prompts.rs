// Shared prompt constants.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured data extractor. \
    You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to extraction prompts so missing data stays empty.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Only use information present in the document. \
    If a field is not present, use an empty string \"\" or an empty list [] \
    according to its shape. Never invent companies, dates, links or grades.";
