//! Rule-based English noun lemmatizer.
//!
//! WordNet-style detachment rules (`-ies` → `-y`, `-ches` → `-ch`, plain `-s`, …)
//! plus a table of irregular plurals. Without a dictionary to confirm candidates
//! the rules are guarded: short tokens, tokens with digits and singular endings
//! such as `-ss`, `-us` and `-is` are left alone.

/// Irregular plural → lemma.
const IRREGULAR: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("analyses", "analysis"),
    ("bases", "basis"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("theses", "thesis"),
    ("hypotheses", "hypothesis"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
    ("curricula", "curriculum"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("halves", "half"),
    ("shelves", "shelf"),
];

/// Words that end in `s` but are already singular (or invariant).
const INVARIANT: &[&str] = &[
    "series",
    "species",
    "news",
    "physics",
    "mathematics",
    "economics",
    "statistics",
    "analytics",
    "logistics",
    "ethics",
    "robotics",
    "electronics",
    "graphics",
    "kubernetes",
    "aws",
    "sas",
    "ios",
    "macos",
    "js",
    "nodejs",
    "vuejs",
    "nextjs",
    "redis",
    "postgres",
];

/// Suffix detachment rules, longest suffix first.
const RULES: &[(&str, &str)] = &[
    ("ches", "ch"),
    ("shes", "sh"),
    ("sses", "ss"),
    ("ies", "y"),
    ("xes", "x"),
    ("men", "man"),
    ("s", ""),
];

const MIN_LEMMA_LEN: usize = 4;
const MAX_PASSES: usize = 4;

/// Reduces `token` (lowercase) to its noun lemma.
///
/// Rules are applied until the word stops changing, so
/// `lemmatize(lemmatize(w)) == lemmatize(w)`.
pub fn lemmatize(token: &str) -> String {
    let mut current = token.to_string();
    for _ in 0..MAX_PASSES {
        let next = lemmatize_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn lemmatize_once(token: &str) -> String {
    if let Some((_, lemma)) = IRREGULAR.iter().find(|(plural, _)| *plural == token) {
        return (*lemma).to_string();
    }

    if token.len() < MIN_LEMMA_LEN
        || INVARIANT.contains(&token)
        || !token.chars().all(|c| c.is_ascii_alphabetic())
        || is_singular_form(token)
    {
        return token.to_string();
    }

    for (suffix, replacement) in RULES {
        if let Some(stem) = token.strip_suffix(suffix) {
            if stem.len() + replacement.len() < 3 {
                continue;
            }
            return format!("{stem}{replacement}");
        }
    }

    token.to_string()
}

fn is_singular_form(token: &str) -> bool {
    token.ends_with("ss") || token.ends_with("us") || token.ends_with("is")
}
