//! Text classifiers used by step synthesis and rendering.
//!
//! These are plain keyword heuristics kept behind small functions so a
//! richer classifier can replace them without touching the generator or the
//! renderer.

use once_cell::sync::Lazy;
use regex::Regex;

static CONSTRAINT_WORDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(must|cannot|can't|can not|required|mandatory|invalid|not|only|unique|error|reject\w*|at least|at most|maximum|minimum|exceed\w*|prevent\w*|limit\w*|missing|empty|duplicate\w*|denied|block\w*)\b",
    )
    .expect("constraint pattern is valid")
});

static INLINE_CREDENTIAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(password|passwd|pwd|username|user|secret|token|api_?key)\b["']?\s*[:=]?\s*["'`]([A-Za-z0-9]{8,})["'`]"#,
    )
    .expect("credential pattern is valid")
});

/// Whether the text is about authenticating into the application
pub fn is_login_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("login") || lower.contains("sign in")
}

/// Whether an acceptance criterion reads as a rule that invalid input should
/// break. Criteria that instead describe a successful outcome ("Successful
/// login redirects to home page") make poor negative scenarios.
pub fn criterion_reads_as_constraint(criterion: &str) -> bool {
    CONSTRAINT_WORDING.is_match(criterion)
}

/// Returns the field name of the first quoted credential-looking literal in
/// the text, if any.
pub fn find_inline_credential(text: &str) -> Option<String> {
    INLINE_CREDENTIAL
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
