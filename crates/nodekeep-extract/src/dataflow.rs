//! Data-flow idioms inside a component source.
//!
//! * **Write**: a call to one of the configured write functions whose
//!   argument list holds an object literal. The literal's top-level keys are
//!   the fields the component writes.
//! * **Read**: a `data.field` or `data?.field` access.
//! * **Recompute**: a hook call (`useEffect`, `useMemo`, ...) whose last
//!   argument is a dependency array. The array entries decide which field
//!   changes re-run the body.
//!
//! Offsets returned here index into the original source and are suitable
//! for building text edits.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::lexer::{mask_non_code, matching_close, split_top_level};

static FIELD_ACCESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((?:[A-Za-z_$][\w$]*\??\.)*?)\bdata(\??)\.([A-Za-z_$][\w$]*)")
        .expect("valid regex literal")
});

/// Function names that make up the write and recompute idioms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFlowIdioms {
    pub write_calls: Vec<String>,
    pub recompute_hooks: Vec<String>,
}

impl Default for DataFlowIdioms {
    fn default() -> Self {
        Self {
            write_calls: vec!["updateNodeData".to_string()],
            recompute_hooks: ["useEffect", "useMemo", "useCallback"]
                .map(String::from)
                .to_vec(),
        }
    }
}

/// An object literal and its top-level keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLiteral {
    /// From `{` through `}` inclusive.
    pub span: Range<usize>,
    pub keys: Vec<String>,
}

/// One occurrence of a write call carrying an object literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteCall {
    pub callee: String,
    pub start: usize,
    /// 1-based line of the callee.
    pub line: usize,
    pub object: ObjectLiteral,
}

/// A `data.field` style access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAccess {
    pub field: String,
    /// The whole access expression, e.g. `node.data?.value`.
    pub expr: String,
    pub range: Range<usize>,
}

/// A dependency array and its entries as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepsArray {
    /// From `[` through `]` inclusive.
    pub span: Range<usize>,
    pub entries: Vec<String>,
}

impl DepsArray {
    /// Whether a change to `field` re-runs the hook.
    ///
    /// An entry covers a field when it names it, ends with `.field` or
    /// `?.field`, or names the whole `data` object.
    pub fn covers(&self, field: &str) -> bool {
        let suffix = format!(".{field}");
        self.entries.iter().any(|entry| {
            let e = entry.replace("?.", ".");
            e == field || e.ends_with(&suffix) || e == "data" || e.ends_with(".data")
        })
    }
}

/// One recompute hook call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecomputeBlock {
    pub hook: String,
    pub start: usize,
    /// 1-based line of the hook name.
    pub line: usize,
    /// Arguments before the dependency array (the callback).
    pub body: Range<usize>,
    /// `None` when the hook has no dependency array and runs on every render.
    pub deps: Option<DepsArray>,
}

impl RecomputeBlock {
    /// Field accesses inside the body.
    pub fn accesses(&self, src: &str) -> Vec<FieldAccess> {
        field_accesses(src)
            .into_iter()
            .filter(|a| a.range.start >= self.body.start && a.range.end <= self.body.end)
            .collect()
    }

    /// Fields read in the body that the dependency array does not cover,
    /// each paired with the first access expression that reads it.
    pub fn uncovered(&self, src: &str) -> Vec<FieldAccess> {
        let Some(deps) = &self.deps else {
            return Vec::new();
        };
        let mut seen = BTreeSet::new();
        self.accesses(src)
            .into_iter()
            .filter(|a| !deps.covers(&a.field) && seen.insert(a.field.clone()))
            .collect()
    }
}

/// Every write call in `src` that carries an object literal.
pub fn write_calls(src: &str, idioms: &DataFlowIdioms) -> Vec<WriteCall> {
    let masked = mask_non_code(src);
    let mut out = Vec::new();
    for callee in &idioms.write_calls {
        for (start, open) in call_sites(&masked, callee) {
            let Some(close) = matching_close(&masked, open) else {
                continue;
            };
            let Some(brace) = first_top_level_brace(&masked, open + 1..close) else {
                continue;
            };
            let Some(end) = matching_close(&masked, brace).filter(|&e| e < close) else {
                continue;
            };
            out.push(WriteCall {
                callee: callee.clone(),
                start,
                line: nodekeep_text::line_of_offset(src, start),
                object: ObjectLiteral {
                    span: brace..end + 1,
                    keys: object_keys(src, &masked, brace, end),
                },
            });
        }
    }
    out.sort_by_key(|c| c.start);
    out
}

/// Union of the keys written by every write call.
pub fn written_fields(src: &str, idioms: &DataFlowIdioms) -> BTreeSet<String> {
    write_calls(src, idioms)
        .into_iter()
        .flat_map(|c| c.object.keys)
        .collect()
}

/// Every `data.field` access outside comments and strings.
pub fn field_accesses(src: &str) -> Vec<FieldAccess> {
    let masked = mask_non_code(src);
    FIELD_ACCESS
        .captures_iter(&masked)
        .filter_map(|c| {
            let whole = c.get(0)?;
            Some(FieldAccess {
                field: c.get(3)?.as_str().to_string(),
                expr: src[whole.range()].to_string(),
                range: whole.range(),
            })
        })
        .collect()
}

/// Fields read anywhere in `src`.
pub fn read_fields(src: &str) -> BTreeSet<String> {
    field_accesses(src).into_iter().map(|a| a.field).collect()
}

/// Every configured recompute hook call in `src`.
pub fn recompute_blocks(src: &str, idioms: &DataFlowIdioms) -> Vec<RecomputeBlock> {
    let masked = mask_non_code(src);
    let mut out = Vec::new();
    for hook in &idioms.recompute_hooks {
        for (start, open) in call_sites(&masked, hook) {
            let Some(close) = matching_close(&masked, open) else {
                continue;
            };
            let args: Vec<Range<usize>> = split_top_level(&masked, open + 1..close)
                .into_iter()
                .filter(|r| !masked[r.clone()].trim().is_empty())
                .collect();
            let Some(first) = args.first() else {
                continue;
            };

            let deps = match args.last() {
                Some(last) if args.len() > 1 => deps_array(src, &masked, last.clone()),
                _ => None,
            };
            let body_end = match (&deps, args.len()) {
                (Some(_), n) if n > 1 => args[n - 2].end,
                _ => close,
            };
            out.push(RecomputeBlock {
                hook: hook.clone(),
                start,
                line: nodekeep_text::line_of_offset(src, start),
                body: first.start..body_end,
                deps,
            });
        }
    }
    out.sort_by_key(|b| b.start);
    out
}

/// `(name_start, open_paren)` for each call of `name` in masked text.
///
/// The name must stand alone as an identifier; a member call such as
/// `React.useEffect(` also counts.
fn call_sites(masked: &str, name: &str) -> Vec<(usize, usize)> {
    let bytes = masked.as_bytes();
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(pos) = masked[from..].find(name) {
        let start = from + pos;
        let end = start + name.len();
        from = end;

        let before_ok = masked[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !nodekeep_text::is_word_char(c));
        if !before_ok {
            continue;
        }
        let mut idx = end;
        while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
            idx += 1;
        }
        if bytes.get(idx) == Some(&b'(') {
            out.push((start, idx));
        }
    }
    out
}

fn first_top_level_brace(masked: &str, range: Range<usize>) -> Option<usize> {
    let bytes = masked.as_bytes();
    let mut depth = 0i64;
    for idx in range {
        match bytes[idx] {
            b'{' if depth == 0 => return Some(idx),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Top-level keys of the object literal spanning `open..=close`.
///
/// Spreads and computed keys are skipped. Quoted keys are read from the
/// original source since their text is masked.
fn object_keys(src: &str, masked: &str, open: usize, close: usize) -> Vec<String> {
    let mut keys = Vec::new();
    for part in split_top_level(masked, open + 1..close) {
        let text = &masked[part.clone()];
        let lead = text.len() - text.trim_start().len();
        let begin = part.start + lead;
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.starts_with("...") || trimmed.starts_with('[') {
            continue;
        }

        let key = if trimmed.starts_with('\'') || trimmed.starts_with('"') {
            let quote = &src[begin..begin + 1];
            src[begin + 1..part.end]
                .split(quote)
                .next()
                .unwrap_or_default()
                .to_string()
        } else {
            trimmed
                .chars()
                .take_while(|c| nodekeep_text::is_word_char(*c))
                .collect()
        };
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

fn deps_array(src: &str, masked: &str, arg: Range<usize>) -> Option<DepsArray> {
    let text = &masked[arg.clone()];
    let lead = text.len() - text.trim_start().len();
    let open = arg.start + lead;
    if masked.as_bytes().get(open) != Some(&b'[') {
        return None;
    }
    let close = matching_close(masked, open).filter(|&c| c < arg.end)?;
    if !masked.get(close + 1..arg.end)?.trim().is_empty() {
        return None;
    }
    let entries = split_top_level(masked, open + 1..close)
        .into_iter()
        .map(|r| src[r].trim().to_string())
        .filter(|e| !e.is_empty())
        .collect();
    Some(DepsArray {
        span: open..close + 1,
        entries,
    })
}
