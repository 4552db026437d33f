//! # nodekeep-text
//!
//! **Tier 1 (Utilities)**
//!
//! Identity derivation and approximate string matching shared by the registry
//! store and the reference validator, plus small word/line helpers used by
//! fixers.
//!
//! ## What belongs here
//! * File name -> component identity normalization
//! * Edit distance and nearest-identity suggestions
//! * Whole-word replacement, offset/line conversion
//!
//! ## What does NOT belong here
//! * File I/O
//! * Source-idiom extraction (use nodekeep-extract)

#![forbid(unsafe_code)]

/// Largest edit distance at which a suggestion is still offered.
pub const SUGGESTION_THRESHOLD: usize = 3;

/// Normalize a type name to the registry identity convention: first letter
/// lower-cased, remainder preserved.
pub fn component_id(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Derive an identity from a file name by dropping the final extension.
///
/// Returns `None` for names with an empty stem (e.g. `.jsx`).
pub fn id_from_file_name(file_name: &str) -> Option<String> {
    let stem = match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(idx) => &file_name[..idx],
    };
    if stem.is_empty() || stem.starts_with('.') {
        return None;
    }
    Some(component_id(stem))
}

/// Inverse presentation of [`component_id`]: first letter upper-cased.
pub fn type_name(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Classic Levenshtein distance over the full strings.
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// The closest candidate and its distance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub id: String,
    pub distance: usize,
}

/// Find the candidate nearest to `needle`.
///
/// Returns a suggestion only when the minimum distance is `<= threshold`.
/// Ties keep the first candidate in iteration order, so callers passing
/// sorted candidates get a deterministic answer.
pub fn nearest<'a, I>(needle: &str, candidates: I, threshold: usize) -> Option<Suggestion>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<Suggestion> = None;
    for candidate in candidates {
        let distance = edit_distance(needle, candidate);
        if best.as_ref().is_none_or(|b| distance < b.distance) {
            best = Some(Suggestion {
                id: candidate.to_string(),
                distance,
            });
        }
    }
    best.filter(|b| b.distance <= threshold)
}

/// Characters that continue an identifier-like word.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Byte offsets of every whole-word occurrence of `word` in `text`.
pub fn find_whole_word(text: &str, word: &str) -> Vec<usize> {
    if word.is_empty() {
        return Vec::new();
    }
    let mut hits = Vec::new();
    let mut from = 0;
    while let Some(rel) = text[from..].find(word) {
        let start = from + rel;
        let end = start + word.len();
        let before_ok = text[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !is_word_char(c));
        let after_ok = text[end..].chars().next().is_none_or(|c| !is_word_char(c));
        if before_ok && after_ok {
            hits.push(start);
        }
        from = end;
    }
    hits
}

/// Replace whole-word occurrences of `from` with `to`, returning the new
/// text and the number of replacements.
pub fn replace_whole_word(text: &str, from: &str, to: &str) -> (String, usize) {
    let hits = find_whole_word(text, from);
    if hits.is_empty() {
        return (text.to_string(), 0);
    }
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for start in &hits {
        out.push_str(&text[cursor..*start]);
        out.push_str(to);
        cursor = start + from.len();
    }
    out.push_str(&text[cursor..]);
    (out, hits.len())
}

/// 1-based line number containing byte `offset`.
pub fn line_of_offset(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    text.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}
