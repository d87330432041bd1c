//! YAML renderer.
//!
//! `serde_yaml` writes every sequence in block style. The `modes` and
//! `allowed_modes` lists are folded back into one-line flow sequences
//! afterwards, which keeps manifests short and diff-friendly.

use crate::model::Manifest;
use crate::render::Renderer;
use anyhow::{Context, Result};

/// Keys whose scalar lists render as `[a, b]`.
const FLOW_KEYS: [&str; 2] = ["modes", "allowed_modes"];

pub struct YamlRenderer;

impl Renderer for YamlRenderer {
    fn render(&self, manifest: &Manifest) -> Result<String> {
        let yaml = serde_yaml::to_string(manifest).context("failed to serialize manifest as YAML")?;
        Ok(compact_flow_lists(&yaml, &FLOW_KEYS))
    }

    fn file_extension(&self) -> &str {
        "yaml"
    }
}

/// Rewrite `key:` followed by block items of plain scalars as `key: [a, b]`.
///
/// Lists holding anything that is not a plain one-line scalar are left
/// alone.
pub fn compact_flow_lists(yaml: &str, keys: &[&str]) -> String {
    let lines: Vec<&str> = yaml.lines().collect();
    let mut out = String::with_capacity(yaml.len());
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if let Some(col) = flow_key_column(line, keys) {
            if let Some((items, consumed)) = block_items(&lines[i + 1..], col) {
                out.push_str(line);
                out.push_str(" [");
                out.push_str(&items.join(", "));
                out.push_str("]\n");
                i += 1 + consumed;
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
        i += 1;
    }
    out
}

/// Column of the key if `line` is exactly `<indent>[- ]key:`.
fn flow_key_column(line: &str, keys: &[&str]) -> Option<usize> {
    let mut col = line.len() - line.trim_start_matches(' ').len();
    let mut rest = &line[col..];
    while let Some(r) = rest.strip_prefix("- ") {
        rest = r;
        col += 2;
    }
    let key = rest.strip_suffix(':')?;
    keys.contains(&key).then_some(col)
}

/// Scalar items of the block sequence that starts at `lines[0]`, plus the
/// number of lines they span.
fn block_items<'a>(lines: &[&'a str], key_col: usize) -> Option<(Vec<&'a str>, usize)> {
    let mut items = Vec::new();
    let mut item_col = None;

    for line in lines {
        let col = line.len() - line.trim_start_matches(' ').len();
        let Some(item) = line[col..].strip_prefix("- ") else {
            // A deeper non-item line continues the previous item
            if col > key_col && !items.is_empty() {
                return None;
            }
            break;
        };
        if col != key_col && col != key_col + 2 {
            break;
        }
        if *item_col.get_or_insert(col) != col {
            break;
        }
        if !is_plain_scalar(item) {
            return None;
        }
        items.push(item.trim_end());
    }

    (!items.is_empty()).then(|| {
        let n = items.len();
        (items, n)
    })
}

fn is_plain_scalar(item: &str) -> bool {
    let item = item.trim();
    !item.is_empty()
        && !item.contains(['[', ']', '{', '}', ',', '#'])
        && !item.contains(": ")
        && !item.ends_with(':')
        && !item.starts_with(['-', '&', '*', '!', '|', '>', '?', '%', '@', '`'])
}
