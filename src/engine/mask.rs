//! Text rewriting primitives shared by the matcher and propagation passes.
//! All offsets here are character offsets, matching the NLP annotation
//! convention, so multi-byte text never shifts a span.

use crate::models::Span;

/// Replace each whitespace-delimited word with an equal-length run of '*',
/// preserving word boundaries and count: "hi there" -> "** *****"
pub fn star_mask(text: &str) -> String {
    text.split_whitespace()
        .map(|word| "*".repeat(word.chars().count()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replace each whitespace-delimited word with the label token:
/// ("hi there", "[PERSON]") -> "[PERSON] [PERSON]"
pub fn label_expand(text: &str, label: &str) -> String {
    text.split_whitespace()
        .map(|_| label)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replace the character range `span` of `text` with `replacement`
pub fn splice(text: &str, span: Span, replacement: &str) -> String {
    let mut out: String = text.chars().take(span.start).collect();
    out.push_str(replacement);
    out.extend(text.chars().skip(span.end));
    out
}

/// Character-offset substring `[start, end)` of `text`
pub fn char_slice(text: &str, span: Span) -> String {
    text.chars().skip(span.start).take(span.len()).collect()
}

/// Number of characters in `text`
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
