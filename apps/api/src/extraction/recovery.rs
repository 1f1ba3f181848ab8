//! Pulls a JSON object out of free-form model output.
//!
//! The reply is sliced from the first `{` to the last `}` and then repaired in a
//! fixed order:
//!
//! 1. triple-quoted values collapse to ordinary strings, typographic quotes
//!    outside strings become ASCII quotes
//! 2. bare values after a `:` are re-quoted (`"name": Jane Doe,` → `"name": "Jane Doe",`)
//! 3. only if strict parsing still fails, trailing commas before `}`/`]` are dropped
//!
//! Steps 2 and 3 track string boundaries, so valid JSON passes through unchanged.
//! After a successful parse every required field missing from the record is
//! filled with its default; present values and unexpected keys are kept as-is.
//!
//! Callers only see `ExtractionError`, so the repair chain can be replaced (for
//! example by a provider-side structured output mode) without touching them.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};
use thiserror::Error;

/// Longest slice prefix carried in an error, in characters.
pub const EXCERPT_CHARS: usize = 500;

static TRIPLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)"""(.*?)""""#).unwrap());

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no JSON object found")]
    NoJsonObject,

    #[error("model output is not valid JSON after repair: {diagnostic}")]
    Malformed { diagnostic: String, excerpt: String },
}

/// Recovers a JSON object from `raw` and backfills `required_fields`.
pub fn recover(
    raw: &str,
    required_fields: &Map<String, Value>,
) -> Result<Map<String, Value>, ExtractionError> {
    let slice = locate_object(raw)?;

    let repaired = quote_bare_values(&normalize_quotes(&collapse_triple_quotes(slice)));

    let mut record = match parse_object(&repaired) {
        Ok(record) => record,
        Err(_) => {
            let without_commas = remove_trailing_commas(&repaired);
            parse_object(&without_commas).map_err(|diagnostic| ExtractionError::Malformed {
                diagnostic,
                excerpt: excerpt(slice),
            })?
        }
    };

    backfill(&mut record, required_fields);
    Ok(record)
}

/// Inserts defaults for absent keys. Existing values, including `null`, win.
pub fn backfill(record: &mut Map<String, Value>, required_fields: &Map<String, Value>) {
    for (field, default) in required_fields {
        if !record.contains_key(field) {
            record.insert(field.clone(), default.clone());
        }
    }
}

/// Inserts defaults for absent keys of every object item inside the array fields
/// named in `item_defaults`. Non-object items are left alone.
pub fn backfill_items(record: &mut Map<String, Value>, item_defaults: &Map<String, Value>) {
    for (field, defaults) in item_defaults {
        let (Some(Value::Array(items)), Value::Object(defaults)) = (record.get_mut(field), defaults)
        else {
            continue;
        };
        for item in items.iter_mut() {
            if let Value::Object(item) = item {
                backfill(item, defaults);
            }
        }
    }
}

fn locate_object(raw: &str) -> Result<&str, ExtractionError> {
    let start = raw.find('{').ok_or(ExtractionError::NoJsonObject)?;
    let end = raw.rfind('}').ok_or(ExtractionError::NoJsonObject)?;
    if end < start {
        return Err(ExtractionError::NoJsonObject);
    }
    Ok(&raw[start..=end])
}

fn parse_object(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("top-level JSON value is not an object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_CHARS).collect()
}

fn collapse_triple_quotes(text: &str) -> String {
    TRIPLE_QUOTED
        .replace_all(text, |caps: &Captures| json_string(caps[1].trim()))
        .into_owned()
}

/// Maps typographic double quotes that delimit strings to `"`. Typographic quotes
/// inside ordinary strings are content and stay untouched.
fn normalize_quotes(text: &str) -> String {
    enum Scan {
        Outside,
        Ascii { escaped: bool },
        Typographic,
    }

    let mut out = String::with_capacity(text.len());
    let mut scan = Scan::Outside;

    for c in text.chars() {
        scan = match scan {
            Scan::Outside => match c {
                '"' => {
                    out.push(c);
                    Scan::Ascii { escaped: false }
                }
                '\u{201C}' | '\u{201D}' => {
                    out.push('"');
                    Scan::Typographic
                }
                '\u{2018}' | '\u{2019}' => {
                    out.push('\'');
                    Scan::Outside
                }
                _ => {
                    out.push(c);
                    Scan::Outside
                }
            },
            Scan::Ascii { escaped } => {
                out.push(c);
                if escaped {
                    Scan::Ascii { escaped: false }
                } else if c == '\\' {
                    Scan::Ascii { escaped: true }
                } else if c == '"' {
                    Scan::Outside
                } else {
                    Scan::Ascii { escaped: false }
                }
            }
            Scan::Typographic => match c {
                '\u{201C}' | '\u{201D}' => {
                    out.push('"');
                    Scan::Outside
                }
                '"' => {
                    out.push_str("\\\"");
                    Scan::Typographic
                }
                _ => {
                    out.push(c);
                    Scan::Typographic
                }
            },
        };
    }

    out
}

/// Wraps bare (unquoted, non-literal) values that follow a `:` in quotes.
fn quote_bare_values(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
                i += 1;
            }
            ':' => {
                out.push(c);
                let start = (i + 1..chars.len())
                    .find(|&k| !chars[k].is_whitespace())
                    .unwrap_or(chars.len());
                out.extend(&chars[i + 1..start]);
                i = start;

                if start == chars.len() || matches!(chars[start], '"' | '{' | '[') {
                    continue;
                }

                let end = (start..chars.len())
                    .find(|&k| matches!(chars[k], ',' | '}' | ']' | '\n'))
                    .unwrap_or(chars.len());
                let token: String = chars[start..end].iter().collect();
                let value = token.trim_end();

                if value.is_empty() || is_json_literal(value) {
                    continue;
                }

                out.push_str(&bare_value_to_json(value));
                out.push_str(&token[value.len()..]);
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

fn is_json_literal(token: &str) -> bool {
    matches!(
        serde_json::from_str::<Value>(token),
        Ok(Value::Number(_) | Value::Bool(_) | Value::Null)
    )
}

fn bare_value_to_json(value: &str) -> String {
    match value {
        "True" => "true".to_string(),
        "False" => "false".to_string(),
        "None" | "NULL" | "Null" => "null".to_string(),
        _ => {
            let unquoted = value
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .unwrap_or(value);
            json_string(unquoted)
        }
    }
}

/// Drops commas that directly precede `}` or `]` (whitespace allowed), outside strings.
fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().copied().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

fn json_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fields must be an object"),
        }
    }

    fn no_fields() -> Map<String, Value> {
        Map::new()
    }

    #[test]
    fn test_commentary_trailing_comma_and_missing_field() {
        let raw = r#"Here is the data: {"skills": ["a","b"],}"#;
        let record = recover(raw, &fields(json!({"summary": ""}))).unwrap();
        assert_eq!(Value::Object(record), json!({"skills": ["a", "b"], "summary": ""}));
    }

    #[test]
    fn test_no_braces_is_extraction_error() {
        let err = recover("I could not find any resume data.", &no_fields()).unwrap_err();
        assert!(matches!(err, ExtractionError::NoJsonObject));
        assert_eq!(err.to_string(), "no JSON object found");
    }

    #[test]
    fn test_closing_brace_before_opening_is_extraction_error() {
        let err = recover("} nothing here {", &no_fields()).unwrap_err();
        assert!(matches!(err, ExtractionError::NoJsonObject));
    }

    #[test]
    fn test_triple_quoted_value_collapses() {
        let record = recover(r#"{"name": """Jane"""}"#, &no_fields()).unwrap();
        assert_eq!(Value::Object(record), json!({"name": "Jane"}));
    }

    #[test]
    fn test_triple_quoted_multiline_value_is_escaped() {
        let raw = "{\"summary\": \"\"\"Builds \"fast\" systems\nat scale\"\"\"}";
        let record = recover(raw, &no_fields()).unwrap();
        assert_eq!(record["summary"], "Builds \"fast\" systems\nat scale");
    }

    #[test]
    fn test_smart_quoted_values() {
        let raw = "{\u{201C}name\u{201D}: \u{201C}Jane Doe\u{201D}, \u{201C}skills\u{201D}: [\u{201C}Rust\u{201D}]}";
        let record = recover(raw, &no_fields()).unwrap();
        assert_eq!(Value::Object(record), json!({"name": "Jane Doe", "skills": ["Rust"]}));
    }

    #[test]
    fn test_smart_quotes_inside_strings_are_preserved() {
        let raw = "{\"summary\": \"Known as \u{201C}the fixer\u{201D}\"}";
        let record = recover(raw, &no_fields()).unwrap();
        assert_eq!(record["summary"], "Known as \u{201C}the fixer\u{201D}");
    }

    #[test]
    fn test_bare_values_are_requoted() {
        let raw = "{\"name\": Jane Doe, \"linkedin\": 'linkedin.com/in/jane', \"years\": 7, \"remote\": true, \"manager\": None}";
        let record = recover(raw, &no_fields()).unwrap();
        assert_eq!(
            Value::Object(record),
            json!({
                "name": "Jane Doe",
                "linkedin": "linkedin.com/in/jane",
                "years": 7,
                "remote": true,
                "manager": null
            })
        );
    }

    #[test]
    fn test_bare_value_before_closing_brace() {
        let record = recover("{\"summary\": Backend engineer}", &no_fields()).unwrap();
        assert_eq!(record["summary"], "Backend engineer");
    }

    #[test]
    fn test_valid_json_with_colons_and_commas_in_strings_is_untouched() {
        let raw = r#"{"description": "Led team: built APIs, shipped v2", "link": "https://x.dev/a,b"}"#;
        let record = recover(raw, &no_fields()).unwrap();
        assert_eq!(record["description"], "Led team: built APIs, shipped v2");
        assert_eq!(record["link"], "https://x.dev/a,b");
    }

    #[test]
    fn test_trailing_commas_in_nested_structures() {
        let raw = r#"```json
{
  "experience": [
    {"company": "Acme", "position": "Engineer",},
  ],
  "skills": ["Go", "Rust",],
}
```"#;
        let record = recover(raw, &no_fields()).unwrap();
        assert_eq!(record["experience"][0]["company"], "Acme");
        assert_eq!(record["skills"], json!(["Go", "Rust"]));
    }

    #[test]
    fn test_commas_inside_strings_survive_trailing_comma_repair() {
        let raw = r#"{"summary": "Rust, Go, ]", "skills": ["a",],}"#;
        let record = recover(raw, &no_fields()).unwrap();
        assert_eq!(record["summary"], "Rust, Go, ]");
        assert_eq!(record["skills"], json!(["a"]));
    }

    #[test]
    fn test_unrepairable_output_reports_bounded_excerpt() {
        let mut raw = String::from("{\"skills\": [\"a\" \"b\"]");
        raw.push_str(&"x".repeat(2000));
        raw.push('}');

        let err = recover(&raw, &no_fields()).unwrap_err();
        match err {
            ExtractionError::Malformed {
                diagnostic,
                excerpt,
            } => {
                assert!(!diagnostic.is_empty());
                assert_eq!(excerpt.chars().count(), EXCERPT_CHARS);
                assert!(excerpt.starts_with("{\"skills\""));
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_backfill_never_overwrites_existing_values() {
        let raw = r#"{"summary": "Existing summary", "skills": [], "linkedin": null}"#;
        let required = fields(json!({
            "summary": "",
            "skills": ["default"],
            "linkedin": "",
            "projects": []
        }));
        let record = recover(raw, &required).unwrap();
        assert_eq!(record["summary"], "Existing summary");
        assert_eq!(record["skills"], json!([]));
        assert_eq!(record["linkedin"], Value::Null);
        assert_eq!(record["projects"], json!([]));
    }

    #[test]
    fn test_backfill_items_fills_each_nested_record() {
        let mut record = fields(json!({
            "experience": [
                {"company": "Acme", "title": "kept"},
                "free text entry",
                {"company": "Globex", "endDate": "Present"}
            ],
            "summary": "unchanged"
        }));
        let items = fields(json!({
            "experience": {"company": "", "endDate": ""},
            "projects": {"title": ""}
        }));

        backfill_items(&mut record, &items);

        assert_eq!(
            record["experience"],
            json!([
                {"company": "Acme", "title": "kept", "endDate": ""},
                "free text entry",
                {"company": "Globex", "endDate": "Present"}
            ])
        );
        assert!(!record.contains_key("projects"));
        assert_eq!(record["summary"], "unchanged");
    }

    #[test]
    fn test_unexpected_keys_are_preserved() {
        let raw = r#"{"skills": ["Rust"], "hobbies": ["chess"]}"#;
        let record = recover(raw, &fields(json!({"skills": [], "summary": ""}))).unwrap();
        assert_eq!(record["hobbies"], json!(["chess"]));
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let text = "é".repeat(EXCERPT_CHARS + 10);
        assert_eq!(excerpt(&text).chars().count(), EXCERPT_CHARS);
    }
}
