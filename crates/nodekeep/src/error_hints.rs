use anyhow::Error;

pub(crate) fn format(err: &Error) -> String {
    let mut out = format!("Error: {err:#}");
    let hints = suggestions(err);
    if !hints.is_empty() {
        out.push_str("\n\nHints:\n");
        for hint in hints {
            out.push_str("- ");
            out.push_str(&hint);
            out.push('\n');
        }
    }
    out
}

fn suggestions(err: &Error) -> Vec<String> {
    let chain: Vec<String> = err.chain().map(|e| e.to_string()).collect();
    let haystack = chain.join(" | ").to_ascii_lowercase();
    let mut out: Vec<String> = Vec::new();

    if haystack.contains("registry missing") {
        push_hint(&mut out, "Build the registry first: `nodekeep registry build`.");
    }

    if haystack.contains("schema version") || (haystack.contains("registry") && haystack.contains("malformed")) {
        push_hint(
            &mut out,
            "Rebuild the registry with `nodekeep registry build`; it is always regenerated from sources.",
        );
    }

    if haystack.contains("is not in the registry") {
        push_hint(&mut out, "List known identities with `nodekeep registry list`.");
        push_hint(
            &mut out,
            "Identities are file stems with a lower-cased first letter, e.g. `CatNode.jsx` -> `catNode`.",
        );
    }

    if haystack.contains("no fixer") || haystack.contains("more than one strategy") || haystack.contains("confidence") {
        push_hint(
            &mut out,
            "Check `[[fix.strategies]]` in `nodekeep.toml`, or remove it to use the built-in catalog.",
        );
    }

    if haystack.contains("metrics") && haystack.contains("malformed") {
        push_hint(
            &mut out,
            "The metrics file is corrupt; move it aside and the next run starts a fresh history.",
        );
    }

    if haystack.contains("no such file or directory") || haystack.contains("not found") {
        push_hint(&mut out, "Verify the path exists and is readable.");
        push_hint(&mut out, "Use `--root` to point at the repository root.");
    }

    if haystack.contains("toml") && (haystack.contains("parse") || haystack.contains("invalid")) {
        push_hint(&mut out, "Check `nodekeep.toml` syntax and key names.");
    }

    out
}

fn push_hint(out: &mut Vec<String>, hint: &str) {
    if !out.iter().any(|h| h == hint) {
        out.push(hint.to_string());
    }
}
