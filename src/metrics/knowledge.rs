//! Knowledge-object extraction from free-text teacher output.
//!
//! The teacher is prompted to emit `{"knowledge": ...}` but rarely does so
//! cleanly. Three recognition strategies run in order, each taking the last
//! match it finds; a fenced code block is the most reliable signal and wins
//! even when a bare match appears later in the text:
//!
//! 1. A ```json fenced block containing a `knowledge` field.
//! 2. A bare `{"knowledge": ...}` span, possibly spanning lines.
//! 3. An inline `{"knowledge": ...}` span, accepted only when the text after
//!    it holds balanced quote pairs (so the span did not end inside a
//!    quoted string). The reference semantics use a regex lookahead for
//!    this; the regex crate has none, so the suffix is scanned directly.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FENCED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)```json\s*(\{.*?"knowledge":.*?\})\s*```"#)
        .expect("fenced knowledge pattern is valid")
});

static MULTILINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)\{\s*"knowledge":.*?\}"#).expect("multiline knowledge pattern is valid")
});

static INLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{"knowledge":.*?\}"#).expect("inline knowledge pattern is valid"));

/// Extract the last knowledge object from model output.
///
/// Returns the `knowledge` field's value as-is (a string or a nested
/// structure). Failure is never an error: when no strategy matches, the
/// result is the empty string value.
pub fn extract_last_knowledge_object(text: &str) -> Value {
    if let Some(caps) = FENCED.captures_iter(text).last() {
        if let Some(body) = caps.get(1) {
            return decode_knowledge(body.as_str());
        }
    }

    if let Some(m) = MULTILINE.find_iter(text).last() {
        return decode_knowledge(m.as_str());
    }

    let inline = INLINE
        .find_iter(text)
        .filter(|m| quotes_balanced_after(text, m.end()))
        .last();
    if let Some(m) = inline {
        return decode_knowledge(m.as_str());
    }

    Value::String(String::new())
}

/// A candidate span is only valid if the remaining text contains an even
/// number of double quotes; an odd count means the span's closing brace sat
/// inside a quoted string.
fn quotes_balanced_after(text: &str, end: usize) -> bool {
    text[end..].matches('"').count() % 2 == 0
}

/// Decode a candidate span: strip fence markers if present, parse as JSON
/// and take the `knowledge` field; on parse failure fall back to a textual
/// split on the last `"knowledge":` with one layer of quotes stripped.
fn decode_knowledge(candidate: &str) -> Value {
    let cleaned = candidate.trim();
    let cleaned = cleaned.strip_prefix("```json").unwrap_or(cleaned);
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned);
    let cleaned = cleaned.trim();

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(cleaned) {
        return map
            .get("knowledge")
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()));
    }

    let tail = match cleaned.rfind("\"knowledge\":") {
        Some(idx) => cleaned[idx + "\"knowledge\":".len()..].trim(),
        None => "",
    };
    let tail = tail.strip_prefix('"').unwrap_or(tail);
    let tail = tail.strip_suffix('"').unwrap_or(tail);

    Value::String(tail.to_string())
}

/// Render a knowledge value for prompt embedding: strings as-is, structured
/// values as pretty JSON with non-ASCII preserved.
pub fn knowledge_text(knowledge: &Value) -> String {
    match knowledge {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_default(),
    }
}
