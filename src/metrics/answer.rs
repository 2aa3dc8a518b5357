//! Choice-label extraction from free-text model output.
//!
//! Models are prompted to put their final choice into `\boxed{}`, but the
//! content comes in several conventions:
//!
//! - `\boxed{A}`
//! - `\boxed{\text{A}}`
//! - `\boxed{A. answer text}`
//! - `\boxed{\text{A. answer text}}`
//!
//! Earlier boxed spans are scratch work; only the last non-empty one counts.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches one boxed span. Alternation order encodes shape precedence when
/// a span satisfies several shapes at once: `\text{...}` content first, then
/// a letter followed by `.`/whitespace and trailing text (optionally inside
/// a stray brace), then a bare letter. `(?s)` lets boxed content span lines.
static BOXED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\\boxed\{(\s*\\text\{([^}]*)\}|\s*\{?([A-D][.\s].*?\}?)\}?|\s*([A-D])\s*)\}")
        .expect("boxed answer pattern is valid")
});

/// Extract the choice label (A-D) from the last non-empty `\boxed{}` span.
///
/// Returns `None` when no boxed span is present or the last one does not
/// reduce to a label. Malformed input never errors.
pub fn extract_last_boxed_answer(text: &str) -> Option<String> {
    let mut last: Option<String> = None;

    for caps in BOXED.captures_iter(text) {
        let content = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().trim());

        if let Some(content) = content {
            if !content.is_empty() {
                last = Some(content.to_string());
            }
        }
    }

    let content = last?;
    let mut chars = content.chars();
    let first = chars.next()?;

    if !('A'..='D').contains(&first) {
        return None;
    }

    match chars.next() {
        // Exactly one letter
        None => Some(first.to_string()),
        // Letter followed by '.' or whitespace, then anything
        Some(sep) if sep == '.' || sep.is_whitespace() => Some(first.to_string()),
        Some(_) => None,
    }
}
