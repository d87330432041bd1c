//! Splices and file writes.
//!
//! Edits are `(range, replacement)` pairs applied to an immutable buffer,
//! producing a new buffer. [`FilePatcher`] owns the only code that writes
//! to disk.

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Replace `range` of the original buffer with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub range: Range<usize>,
    pub replacement: String,
}

impl Splice {
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Splice {
            range: at..at,
            replacement: text.into(),
        }
    }

    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Splice {
            range,
            replacement: text.into(),
        }
    }
}

/// Apply non-overlapping splices to `original`.
pub fn apply(original: &str, splices: &[Splice]) -> Result<String> {
    let mut sorted: Vec<&Splice> = splices.iter().collect();
    sorted.sort_by_key(|s| (s.range.start, s.range.end));

    let mut out = String::with_capacity(original.len() + splices.iter().map(|s| s.replacement.len()).sum::<usize>());
    let mut cursor = 0;
    for splice in sorted {
        let Range { start, end } = splice.range;
        if start < cursor {
            bail!("overlapping edits at byte {start}");
        }
        if start > end || end > original.len() {
            bail!("edit range {start}..{end} is outside the {} byte buffer", original.len());
        }
        if !original.is_char_boundary(start) || !original.is_char_boundary(end) {
            bail!("edit range {start}..{end} splits a character");
        }
        out.push_str(&original[cursor..start]);
        out.push_str(&splice.replacement);
        cursor = end;
    }
    out.push_str(&original[cursor..]);
    Ok(out)
}

/// `path` with `.bak` appended to its file name.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Writes whole files, taking a `.bak` copy before the first write of a
/// backed-up file in a run.
#[derive(Debug, Default)]
pub struct FilePatcher {
    backup: bool,
    dry_run: bool,
    backed_up: HashSet<PathBuf>,
}

impl FilePatcher {
    pub fn new(backup: bool, dry_run: bool) -> Self {
        FilePatcher {
            backup,
            dry_run,
            backed_up: HashSet::new(),
        }
    }

    /// Back up `original` (the content read before editing), then overwrite.
    pub fn write_with_backup(&mut self, path: &Path, original: &str, updated: &str) -> Result<()> {
        if self.backup && !self.backed_up.contains(path) {
            let bak = backup_path(path);
            if self.dry_run {
                tracing::info!(path = %bak.display(), "dry run: would write backup");
            } else {
                fs::write(&bak, original)
                    .with_context(|| format!("Failed to write backup {}", bak.display()))?;
                tracing::debug!(path = %bak.display(), "backup written");
            }
            self.backed_up.insert(path.to_path_buf());
        }
        self.write(path, updated)
    }

    /// Overwrite (or create) `path` without a backup.
    pub fn write(&mut self, path: &Path, updated: &str) -> Result<()> {
        if self.dry_run {
            tracing::info!(path = %path.display(), bytes = updated.len(), "dry run: would write");
            return Ok(());
        }
        fs::write(path, updated).with_context(|| format!("Failed to write {}", path.display()))
    }
}
