//! Lexical masking and bracket matching.
//!
//! [`mask_non_code`] blanks out comment bodies and string/template contents
//! while preserving byte offsets and newlines, so structural scans can run on
//! the masked text and slice the original at the same offsets.
//!
//! ## Limitations
//!
//! - Regex literals are not recognized.
//! - Template literal `${...}` expressions are masked with the rest of the
//!   template.
//! - Unterminated `'`/`"` strings (e.g. apostrophes in JSX text) end at the
//!   line break, so at most one line is lost.

/// Blank string contents and comments, keeping quotes, newlines, and byte
/// length intact.
pub fn mask_non_code(src: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        Str(char),
        Template,
    }

    let mut out = String::with_capacity(src.len());
    let mut state = State::Code;
    let mut chars = src.char_indices().peekable();

    let blank = |out: &mut String, c: char| {
        if c == '\n' {
            out.push('\n');
        } else {
            for _ in 0..c.len_utf8() {
                out.push(' ');
            }
        }
    };

    while let Some((_, c)) = chars.next() {
        match state {
            State::Code => match c {
                '/' if chars.peek().map(|(_, n)| *n) == Some('/') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::LineComment;
                }
                '/' if chars.peek().map(|(_, n)| *n) == Some('*') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::BlockComment;
                }
                '\'' | '"' => {
                    out.push(c);
                    state = State::Str(c);
                }
                '`' => {
                    out.push(c);
                    state = State::Template;
                }
                _ => out.push(c),
            },
            State::LineComment => {
                blank(&mut out, c);
                if c == '\n' {
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek().map(|(_, n)| *n) == Some('/') {
                    chars.next();
                    out.push_str("  ");
                    state = State::Code;
                } else {
                    blank(&mut out, c);
                }
            }
            State::Str(q) => {
                if c == '\\' {
                    blank(&mut out, c);
                    if let Some((_, n)) = chars.next() {
                        blank(&mut out, n);
                        if n == '\n' {
                            state = State::Code;
                        }
                    }
                } else if c == q {
                    out.push(c);
                    state = State::Code;
                } else if c == '\n' {
                    out.push('\n');
                    state = State::Code;
                } else {
                    blank(&mut out, c);
                }
            }
            State::Template => {
                if c == '\\' {
                    blank(&mut out, c);
                    if let Some((_, n)) = chars.next() {
                        blank(&mut out, n);
                    }
                } else if c == '`' {
                    out.push(c);
                    state = State::Code;
                } else {
                    blank(&mut out, c);
                }
            }
        }
    }
    out
}

fn closer(open: u8) -> Option<u8> {
    match open {
        b'(' => Some(b')'),
        b'[' => Some(b']'),
        b'{' => Some(b'}'),
        _ => None,
    }
}

/// Index of the bracket closing the one at `open` in already-masked text.
///
/// Only brackets of the same kind are counted, which tolerates stray
/// brackets of other kinds.
pub fn matching_close(masked: &str, open: usize) -> Option<usize> {
    let bytes = masked.as_bytes();
    let open_ch = *bytes.get(open)?;
    let close_ch = closer(open_ch)?;
    let mut depth = 0usize;
    for (idx, b) in bytes.iter().enumerate().skip(open) {
        if *b == open_ch {
            depth += 1;
        } else if *b == close_ch {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}

/// Split `masked[range]` at commas that sit outside any bracket. Returned
/// ranges index into the full text.
pub fn split_top_level(masked: &str, range: std::ops::Range<usize>) -> Vec<std::ops::Range<usize>> {
    let bytes = masked.as_bytes();
    let mut parts = Vec::new();
    let mut depth: i64 = 0;
    let mut start = range.start;
    for idx in range.clone() {
        match bytes[idx] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(start..idx);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(start..range.end);
    parts
}

/// A bracket pair that does not balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Imbalance {
    /// An opener at this offset is never closed.
    Unclosed { at: usize },
    /// A closer at this offset has no opener.
    Unexpected { at: usize },
}

impl Imbalance {
    pub fn offset(&self) -> usize {
        match self {
            Imbalance::Unclosed { at } | Imbalance::Unexpected { at } => *at,
        }
    }
}

/// First imbalance of `open`/`close` in `src`, ignoring strings and comments.
pub fn find_imbalance(src: &str, open: char, close: char) -> Option<Imbalance> {
    let masked = mask_non_code(src);
    let mut stack: Vec<usize> = Vec::new();
    for (idx, c) in masked.char_indices() {
        if c == open {
            stack.push(idx);
        } else if c == close && stack.pop().is_none() {
            return Some(Imbalance::Unexpected { at: idx });
        }
    }
    stack.first().map(|at| Imbalance::Unclosed { at: *at })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_preserves_length_and_newlines() {
        let src = "a = 'x{y}'; // c}\n/* {\n} */ b(\"é\")";
        let masked = mask_non_code(src);
        assert_eq!(masked.len(), src.len());
        assert_eq!(masked.matches('\n').count(), src.matches('\n').count());
        assert!(!masked.contains('{'));
        assert!(!masked.contains('}'));
        assert!(masked.contains("b(\"  \")"));
    }

    #[test]
    fn apostrophe_in_jsx_text_only_masks_one_line() {
        let src = "<p>Don't</p>\n{data.x}";
        let masked = mask_non_code(src);
        assert!(masked.ends_with("{data.x}"));
    }

    #[test]
    fn template_literal_is_masked() {
        let masked = mask_non_code("f(`a ${b} }`)");
        assert_eq!(masked, "f(`         `)");
    }

    #[test]
    fn matching_close_handles_nesting() {
        let text = "f(a, g(b), c)";
        assert_eq!(matching_close(text, 1), Some(12));
        assert_eq!(matching_close(text, 6), Some(8));
        assert_eq!(matching_close("f(", 1), None);
        assert_eq!(matching_close("abc", 1), None);
    }

    #[test]
    fn split_top_level_ignores_nested_commas() {
        let text = "(a, {b, c}, [d, e])";
        let parts: Vec<&str> = split_top_level(text, 1..text.len() - 1)
            .into_iter()
            .map(|r| text[r].trim())
            .collect();
        assert_eq!(parts, vec!["a", "{b, c}", "[d, e]"]);
    }

    #[test]
    fn imbalance_reports_first_offender() {
        assert_eq!(find_imbalance("{ { }", '{', '}'), Some(Imbalance::Unclosed { at: 0 }));
        assert_eq!(find_imbalance("} {", '{', '}'), Some(Imbalance::Unexpected { at: 0 }));
        assert_eq!(find_imbalance("f('(')", '(', ')'), None);
    }
}
