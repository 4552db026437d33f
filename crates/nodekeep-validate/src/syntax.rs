//! Syntax checking through an external checker, with a heuristic fallback.
//!
//! The configured checker runs once per file with the file path appended to
//! its arguments. A zero exit means the file parsed. A non-zero exit is a
//! genuine parse failure (`error`) unless its output carries a tool-absence
//! signature, in which case the checker is considered missing for the rest of
//! the run and every file goes through the fallback instead.
//!
//! Fallback findings (bracket balance, default-export shape) are `warning`s
//! only: they mean "could not verify", not "broken".

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use anyhow::Result;
use nodekeep_extract::lexer::{self, Imbalance};
use nodekeep_types::details::{self, Details};
use nodekeep_types::{Issue, IssueKind, Severity};
use regex::Regex;

use crate::{Validation, Validator, Workspace};

/// Output fragments meaning the checker itself is not installed.
const TOOL_MISSING_SIGNATURES: &[&str] = &[
    "command not found",
    "not recognized as an internal or external command",
    "ENOENT",
    "Cannot find module",
    "could not determine executable to run",
    "No such file or directory (os error 2)",
];

static LOCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":(\d+):(\d+)").expect("valid regex literal"));

static LINE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bline\s+(\d+)").expect("valid regex literal"));

static DEFAULT_EXPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bexport\s+default\b").expect("valid regex literal"));

/// External checker invocation: `program args... <file>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for CheckerCommand {
    fn default() -> Self {
        Self {
            program: "npx".to_string(),
            args: ["--no-install", "esbuild", "--log-level=error"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl CheckerCommand {
    /// Parse a whitespace-separated command line.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(String::from);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

/// What one checker invocation concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Clean,
    /// The checker reported a parse error.
    Failed { line: Option<usize>, message: String },
    /// The checker is not installed.
    Unavailable,
}

/// Classify a finished checker run from its exit status and output.
pub fn classify(success: bool, stdout: &str, stderr: &str) -> CheckOutcome {
    let combined = format!("{stderr}\n{stdout}");
    if TOOL_MISSING_SIGNATURES.iter().any(|s| combined.contains(s)) {
        return CheckOutcome::Unavailable;
    }
    if success {
        return CheckOutcome::Clean;
    }
    let message = combined
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("checker reported an error")
        .to_string();
    let line = LOCATION
        .captures(&combined)
        .or_else(|| LINE_WORD.captures(&combined))
        .and_then(|c| c[1].parse().ok());
    CheckOutcome::Failed { line, message }
}

#[derive(Debug, Clone, Default)]
pub struct SyntaxValidator {
    /// `None` skips the external checker entirely.
    pub checker: Option<CheckerCommand>,
    checker_missing: Cell<bool>,
}

impl SyntaxValidator {
    pub fn new(checker: Option<CheckerCommand>) -> Self {
        Self {
            checker,
            checker_missing: Cell::new(false),
        }
    }

    /// Check one file. `rel` is relative to `root`.
    pub fn check_file(&self, root: &Path, rel: &Path) -> Vec<Issue> {
        let display = nodekeep_walk::to_slash(rel);
        let abs = root.join(rel);
        let source = match nodekeep_extract::read_source(&abs) {
            Ok(text) => text,
            Err(err) => {
                return vec![
                    Issue::new(
                        IssueKind::SyntaxError,
                        Severity::Warning,
                        format!("could not read source: {err}"),
                    )
                    .at(display, None),
                ];
            }
        };

        if let Some(outcome) = self.run_checker(&abs) {
            match outcome {
                CheckOutcome::Clean => return Vec::new(),
                CheckOutcome::Failed { line, message } => {
                    return vec![
                        Issue::new(IssueKind::SyntaxError, Severity::Error, message.clone())
                            .at(display.clone(), line)
                            .with_details(
                                Details::new()
                                    .with(details::FILE, &display)
                                    .with(details::SOURCE, "checker")
                                    .with(details::PROBLEM, message)
                                    .render(),
                            ),
                    ];
                }
                CheckOutcome::Unavailable => {}
            }
        }

        fallback_check(&display, &source)
    }

    fn run_checker(&self, abs: &Path) -> Option<CheckOutcome> {
        let checker = self.checker.as_ref()?;
        if self.checker_missing.get() {
            return None;
        }
        let output = Command::new(&checker.program)
            .args(&checker.args)
            .arg(abs)
            .output();
        let outcome = match output {
            Ok(out) => classify(
                out.status.success(),
                &String::from_utf8_lossy(&out.stdout),
                &String::from_utf8_lossy(&out.stderr),
            ),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => CheckOutcome::Unavailable,
            Err(err) => {
                tracing::warn!(program = %checker.program, error = %err, "checker could not start");
                CheckOutcome::Unavailable
            }
        };
        if outcome == CheckOutcome::Unavailable {
            tracing::info!(program = %checker.program, "syntax checker unavailable, using heuristic fallback");
            self.checker_missing.set(true);
            return None;
        }
        Some(outcome)
    }
}

impl Validator for SyntaxValidator {
    fn name(&self) -> &'static str {
        "syntax"
    }

    fn validate(&self, workspace: &Workspace<'_>) -> Result<Validation> {
        let files: Vec<PathBuf> = workspace
            .registry
            .records()
            .map(|r| PathBuf::from(&r.path))
            .filter(|p| workspace.root.join(p).is_file())
            .collect();
        let issues: Vec<Issue> = files
            .iter()
            .flat_map(|rel| self.check_file(workspace.root, rel))
            .collect();
        Ok(Validation {
            validator: self.name(),
            processed: files.len(),
            issues,
        })
    }
}

/// Heuristic checks used when no checker is available. Every finding is a
/// warning.
pub fn fallback_check(file: &str, source: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    for (open, close, what) in [('{', '}', "brace"), ('(', ')', "parenthesis")] {
        if let Some(imbalance) = lexer::find_imbalance(source, open, close) {
            let line = nodekeep_text::line_of_offset(source, imbalance.offset());
            let summary = match imbalance {
                Imbalance::Unclosed { .. } => format!("unclosed {what} '{open}'"),
                Imbalance::Unexpected { .. } => format!("unexpected closing {what} '{close}'"),
            };
            issues.push(fallback_issue(file, Some(line), summary));
        }
    }

    let masked = lexer::mask_non_code(source);
    match DEFAULT_EXPORT.find(&masked) {
        None => issues.push(fallback_issue(file, None, "no default export".to_string())),
        Some(m) => {
            let rest = masked[m.end()..].trim_start();
            if rest.is_empty() || rest.starts_with(';') || rest.starts_with('}') {
                let line = nodekeep_text::line_of_offset(source, m.start());
                issues.push(fallback_issue(
                    file,
                    Some(line),
                    "default export has no value".to_string(),
                ));
            }
        }
    }
    issues
}

fn fallback_issue(file: &str, line: Option<usize>, summary: String) -> Issue {
    Issue::new(IssueKind::SyntaxError, Severity::Warning, summary.clone())
        .at(file, line)
        .with_details(
            Details::new()
                .with(details::FILE, file)
                .with(details::SOURCE, "fallback")
                .with(details::PROBLEM, summary)
                .render(),
        )
}
