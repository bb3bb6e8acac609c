// Expandrs Matcher
// Pure functions for abbreviation matching and word extraction

/// Whole-word match of a typed word against an abbreviation key.
///
/// Equality is codepoint-wise; when `case_sensitive` is false both sides are
/// lowercased first. No accent/diacritic normalization. Prefixes never match.
pub fn matches(word: &str, key: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        word == key
    } else {
        word.to_lowercase() == key.to_lowercase()
    }
}

/// Extract the whitespace-delimited word ending at the caret.
///
/// Returns the word and its byte offset in `text`, or `None` when the caret
/// is not on a char boundary or no word ends there. Offsets are byte offsets
/// on char boundaries throughout the crate.
pub fn word_before_caret(text: &str, caret: usize) -> Option<(&str, usize)> {
    if caret > text.len() || !text.is_char_boundary(caret) {
        return None;
    }
    let head = &text[..caret];
    let start = match head.rfind(|c: char| c.is_whitespace()) {
        Some(i) => i + head[i..].chars().next().map_or(1, |c| c.len_utf8()),
        None => 0,
    };
    let word = &head[start..];
    if word.is_empty() {
        None
    } else {
        Some((word, start))
    }
}
