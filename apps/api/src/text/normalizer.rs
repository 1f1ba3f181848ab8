//! Turns free text (possibly HTML) into a lemmatized token string.
//!
//! Pipeline, in order:
//! 1. strip markup, keeping visible text
//! 2. drop URLs (`http`, `https`, `ftp`, `ssh` schemes)
//! 3. drop email-like substrings
//! 4. drop every character outside `[A-Za-z0-9\s-]`
//! 5. lowercase and split into tokens
//! 6. drop English stopwords
//! 7. lemmatize each token
//! 8. join with single spaces
//!
//! The function is pure; its output is a fixpoint (`normalize(normalize(x)) == normalize(x)`).

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use crate::text::lemmatizer::lemmatize;
use crate::text::stopwords::is_stopword;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:https?|ftp|ssh)://\S+").unwrap());
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+@\S+").unwrap());
static DISALLOWED_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\s\-]").unwrap());

pub fn normalize(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let visible = strip_markup(text);
    let without_urls = URL_PATTERN.replace_all(&visible, " ");
    let without_emails = EMAIL_PATTERN.replace_all(&without_urls, " ");
    let filtered = DISALLOWED_CHARS.replace_all(&without_emails, "");
    let lowered = filtered.to_lowercase();

    lowered
        .split_whitespace()
        .filter(|token| !is_stopword(token))
        .map(lemma_or_surface)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keeps the surface form when the lemma would itself be a stopword, so a second
/// normalization pass never removes tokens the first pass kept.
fn lemma_or_surface(token: &str) -> String {
    let lemma = lemmatize(token);
    if is_stopword(&lemma) {
        token.to_string()
    } else {
        lemma
    }
}

fn strip_markup(text: &str) -> String {
    if !text.contains('<') && !text.contains('&') {
        return text.to_string();
    }
    let fragment = Html::parse_fragment(text);
    fragment
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
}
