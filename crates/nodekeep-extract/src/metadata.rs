//! Component metadata: category, ports, export name, and display label.
//!
//! Every pattern is matched against the original source, and a match only
//! counts when its first byte is live code in the masked text. That drops
//! commented-out handles and exports without a second parser.

use std::path::{Component, Path};
use std::sync::LazyLock;

use nodekeep_types::{Category, Port};
use regex::Regex;

static HANDLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Handle\b[^>]*>").expect("valid regex literal"));

static HANDLE_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)type\s*=\s*\{?\s*["'](target|source)["']"#).expect("valid regex literal")
});

static HANDLE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)id\s*=\s*\{?\s*["']([^"']+)["']"#).expect("valid regex literal")
});

static HANDLE_UPSTREAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)data-upstream\s*=\s*\{?\s*["']([^"']+)["']"#)
        .expect("valid regex literal")
});

static DEFAULT_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"export\s+default\s+(?:async\s+)?(?:function\s*\*?\s*|class\s+)?(?:(?:React\s*\.\s*)?memo\s*\(\s*)?([A-Za-z_$][\w$]*)",
    )
    .expect("valid regex literal")
});

static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\blabel\s*[:=]\s*(?:'([^'\n]*)'|"([^"\n]*)"|`([^`\n]*)`)"#)
        .expect("valid regex literal")
});

const NOT_A_NAME: &[&str] = &["function", "class", "async", "memo"];

/// Category of the nearest ancestor directory with a recognized name.
pub fn infer_category(rel_path: &Path) -> Category {
    let dirs: Vec<String> = rel_path
        .parent()
        .map(|p| {
            p.components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().to_ascii_lowercase()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    dirs.iter()
        .rev()
        .find_map(|d| category_for_dir(d))
        .unwrap_or_default()
}

fn category_for_dir(dir: &str) -> Option<Category> {
    match dir {
        "input" | "inputs" => Some(Category::Input),
        "process" | "processing" | "processors" => Some(Category::Process),
        "output" | "outputs" => Some(Category::Output),
        "util" | "utils" | "utility" | "utilities" => Some(Category::Utility),
        _ => None,
    }
}

/// Declared ports, split into `(inputs, outputs)`.
///
/// A `<Handle>` without an `id` is not addressable and is skipped. Repeated
/// ids keep their first declaration.
pub fn ports(src: &str, masked: &str) -> (Vec<Port>, Vec<Port>) {
    let mut inputs: Vec<Port> = Vec::new();
    let mut outputs: Vec<Port> = Vec::new();

    for tag in HANDLE_TAG.find_iter(src) {
        if !is_live(masked, tag.start()) {
            continue;
        }
        let text = tag.as_str();
        let Some(id) = HANDLE_ID.captures(text).map(|c| c[1].to_string()) else {
            continue;
        };
        let is_source = HANDLE_TYPE
            .captures(text)
            .is_some_and(|c| &c[1] == "source");

        if is_source {
            if outputs.iter().all(|p| p.id != id) {
                outputs.push(Port::new(id));
            }
        } else if inputs.iter().all(|p| p.id != id) {
            let mut port = Port::new(id);
            if let Some(up) = HANDLE_UPSTREAM.captures(text) {
                port = port.with_upstream(nodekeep_text::component_id(&up[1]));
            }
            inputs.push(port);
        }
    }
    (inputs, outputs)
}

/// Name of the default-exported component, if the export names one.
pub fn export_name(src: &str, masked: &str) -> Option<String> {
    DEFAULT_EXPORT
        .captures_iter(src)
        .filter(|c| c.get(0).is_some_and(|m| is_live(masked, m.start())))
        .find_map(|c| {
            let name = c.get(1)?.as_str();
            (!NOT_A_NAME.contains(&name)).then(|| name.to_string())
        })
}

/// Display label from `label: '...'` or `label = "..."`.
pub fn label(src: &str, masked: &str) -> Option<String> {
    LABEL
        .captures_iter(src)
        .filter(|c| c.get(0).is_some_and(|m| is_live(masked, m.start())))
        .find_map(|c| {
            c.get(1)
                .or_else(|| c.get(2))
                .or_else(|| c.get(3))
                .map(|m| m.as_str().to_string())
        })
}

/// Whether `offset` is code rather than comment or string content.
pub(crate) fn is_live(masked: &str, offset: usize) -> bool {
    masked
        .as_bytes()
        .get(offset)
        .is_some_and(|b| !b.is_ascii_whitespace())
}
