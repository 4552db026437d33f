//! # nodekeep-edit
//!
//! **Tier 1 (Utilities)**
//!
//! Every mutation nodekeep performs on disk goes through this crate: fixers
//! describe their change as [`TextEdit`]s (locate span, replace span) over an
//! immutable [`Snapshot`] of the file, and the result is written with
//! [`write_atomic`] (temp file in the same directory, then rename) so a crash
//! never leaves a half-written file behind.
//!
//! ## What does NOT belong here
//! * Deciding *what* to edit (fixers own that)
//! * Multi-file transactions: each file commits independently

use std::io::Write;
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("edit range {start}..{end} is out of bounds for {len} bytes")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("edit range {start}..{end} does not fall on character boundaries")]
    NotCharBoundary { start: usize, end: usize },

    #[error("edits overlap at byte {at}")]
    Overlap { at: usize },

    #[error("{path} changed on disk since it was read")]
    Stale { path: String },
}

/// Replace the bytes in `range` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range<usize>,
    pub replacement: String,
}

impl TextEdit {
    pub fn replace(range: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at..at, text)
    }
}

/// Apply non-overlapping edits to `text`. Edits may be given in any order.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by_key(|e| (e.range.start, e.range.end));

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for edit in sorted {
        let Range { start, end } = edit.range;
        if start > end || end > text.len() {
            return Err(EditError::OutOfBounds {
                start,
                end,
                len: text.len(),
            });
        }
        if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            return Err(EditError::NotCharBoundary { start, end });
        }
        if start < cursor {
            return Err(EditError::Overlap { at: start });
        }
        out.push_str(&text[cursor..start]);
        out.push_str(&edit.replacement);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

/// Immutable view of a file's content at read time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    path: PathBuf,
    content: String,
}

impl Snapshot {
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Preview the edited content without touching disk.
    pub fn preview(&self, edits: &[TextEdit]) -> Result<String, EditError> {
        apply_edits(&self.content, edits)
    }

    /// Apply `edits` and atomically replace the file.
    ///
    /// Fails with [`EditError::Stale`] if the file no longer matches the
    /// snapshot. Returns the number of edits written; an empty edit list is a
    /// no-op that writes nothing.
    pub fn commit(&self, edits: &[TextEdit]) -> Result<usize> {
        if edits.is_empty() {
            return Ok(0);
        }
        let updated = self.preview(edits)?;
        let current = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to re-read {}", self.path.display()))?;
        if current != self.content {
            return Err(EditError::Stale {
                path: self.path.display().to_string(),
            }
            .into());
        }
        write_atomic(&self.path, updated.as_bytes())?;
        Ok(edits.len())
    }
}

/// Write `contents` to `path` through a temp file in the same directory
/// followed by a rename. Creates missing parent directories.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)
        .with_context(|| format!("Failed to create directory {}", parent.display()))?;

    let mut tmp = NamedTempFile::new_in(&parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
    tmp.write_all(contents)
        .with_context(|| format!("Failed to write temp file for {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("Failed to flush temp file for {}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_apply_in_offset_order() {
        let text = "let a = [x];";
        let edits = vec![
            TextEdit::insert(10, ", y"),
            TextEdit::replace(4..5, "b"),
        ];
        assert_eq!(apply_edits(text, &edits).unwrap(), "let b = [x, y];");
    }

    #[test]
    fn overlapping_edits_are_rejected() {
        let edits = vec![TextEdit::replace(0..4, "a"), TextEdit::replace(2..6, "b")];
        assert_eq!(
            apply_edits("0123456789", &edits),
            Err(EditError::Overlap { at: 2 })
        );
    }

    #[test]
    fn out_of_bounds_edit_is_rejected() {
        let edits = vec![TextEdit::replace(3..20, "x")];
        assert!(matches!(
            apply_edits("abc", &edits),
            Err(EditError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn split_multibyte_char_is_rejected() {
        let edits = vec![TextEdit::replace(1..2, "x")];
        assert!(matches!(
            apply_edits("é", &edits),
            Err(EditError::NotCharBoundary { .. })
        ));
    }

    #[test]
    fn commit_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello world").unwrap();
        let snap = Snapshot::read(&path).unwrap();
        let n = snap.commit(&[TextEdit::replace(6..11, "there")]).unwrap();
        assert_eq!(n, 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello there");
    }

    #[test]
    fn commit_refuses_stale_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "one").unwrap();
        let snap = Snapshot::read(&path).unwrap();
        std::fs::write(&path, "two").unwrap();
        let err = snap.commit(&[TextEdit::insert(0, "x")]).unwrap_err();
        assert!(err.to_string().contains("changed on disk"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
    }

    #[test]
    fn write_atomic_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.json");
        write_atomic(&path, b"{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }
}
