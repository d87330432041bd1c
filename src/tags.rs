//! Comment-tag scanner.
//!
//! Two jobs:
//!
//! 1. **Extraction**: pair every `/** ... */` block with the declaration
//!    that follows it and parse its `@key: value` tag lines.
//! 2. **Insertion**: list the access labels of a class body and tell
//!    whether a label's trailing comment already names a tag type.
//!
//! Nothing here fails. Malformed input yields fewer or weaker results and
//! a `warn!` line, never an error.

use crate::decl::split_declaration;
use crate::model::{TagType, Visibility};
use crate::text::{line_end, line_start, mask_non_code, non_code_regions, Region, RegionKind};
use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

/// Function name used when neither the declaration nor the block names one.
pub const UNKNOWN_NAME: &str = "UnknownCommand";

static RE_TAG_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([A-Za-z_][\w-]*)\s*(?::\s*(.*))?$").unwrap());

static RE_LIST_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,|;]+").unwrap());

static RE_ACCESS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(public|protected|private)\s*:").unwrap());

/// A `/** ... */` block and its parsed tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    /// Tag key to raw value; the first occurrence of a key wins.
    pub tags: HashMap<String, String>,
}

impl CommentBlock {
    /// Parse the full text of a `/** ... */` block.
    pub fn parse(raw: &str) -> Self {
        let inner = raw.strip_prefix("/**").unwrap_or(raw).trim_end();
        let inner = inner.strip_suffix("*/").unwrap_or(inner);

        let mut tags = HashMap::new();
        for line in inner.lines() {
            let line = line.trim().trim_start_matches('*').trim();
            let Some(caps) = RE_TAG_LINE.captures(line) else {
                continue;
            };
            let key = caps[1].to_string();
            let value = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
            tags.entry(key).or_insert(value);
        }
        CommentBlock { tags }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// `@type` compared case-insensitively.
    pub fn has_type(&self, tag_type: TagType) -> bool {
        self.tag("type")
            .is_some_and(|t| t.eq_ignore_ascii_case(tag_type.as_str()))
    }

    /// List-valued tag; missing tags are an empty list.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.tag(key).map(parse_list).unwrap_or_default()
    }
}

/// A tagged block and the declaration right after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedDeclaration {
    pub block: CommentBlock,
    /// Declaration text up to, not including, its `;`.
    pub declaration: String,
    /// Function name; see [`UNKNOWN_NAME`].
    pub name: String,
    pub params: String,
}

/// Every block of type `tag_type` followed by a `;`-terminated declaration,
/// in file order.
pub fn scan(text: &str, tag_type: TagType) -> Vec<TaggedDeclaration> {
    let regions = non_code_regions(text);
    let masked = mask_non_code(text);
    let mut out = Vec::new();

    for (idx, region) in regions.iter().enumerate() {
        if region.kind != RegionKind::BlockComment || !text[region.start..].starts_with("/**") {
            continue;
        }
        let block = CommentBlock::parse(&text[region.start..region.end]);
        if !block.has_type(tag_type) {
            tracing::debug!(offset = region.start, "skipping block of another type");
            continue;
        }
        let Some(decl_range) = declaration_after(text, &masked, region, regions.get(idx + 1)) else {
            tracing::warn!(
                offset = region.start,
                "tagged block is not followed by a declaration ending in ';'"
            );
            continue;
        };

        let declaration = text[decl_range.clone()].trim().to_string();
        let parts = split_declaration(&declaration).unwrap_or_default();
        let name = parts
            .name
            .filter(|n| !n.is_empty())
            .or_else(|| block.tag("command").map(str::trim).filter(|c| !c.is_empty()).map(str::to_string))
            .unwrap_or_else(|| UNKNOWN_NAME.to_string());

        out.push(TaggedDeclaration {
            block,
            declaration,
            name,
            params: parts.params,
        });
    }
    out
}

/// Range of the declaration that directly follows `block`.
///
/// Only whitespace may separate them. The declaration ends at the first
/// `;` at parenthesis depth zero; a `{` or `}` first means a definition or
/// scope change, which does not count.
fn declaration_after(
    text: &str,
    masked: &str,
    block: &Region,
    next: Option<&Region>,
) -> Option<Range<usize>> {
    let gap = text[block.end..].len() - text[block.end..].trim_start().len();
    let start = block.end + gap;
    if start >= text.len() {
        return None;
    }
    if let Some(next) = next {
        if next.start == start {
            return None;
        }
    }

    let mut depth = 0usize;
    for (i, c) in masked[start..].char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => return Some(start..start + i),
            '{' | '}' if depth == 0 => return None,
            _ => {}
        }
    }
    None
}

/// Parse a list-valued tag.
///
/// `[a, b]` is read as a YAML flow sequence first; any parse failure (or a
/// non-scalar item) falls back to splitting on `,`, `|` and `;`. Empty
/// entries are dropped either way.
pub fn parse_list(value: &str) -> Vec<String> {
    let s = value.trim();
    if s.is_empty() {
        return Vec::new();
    }
    if s.starts_with('[') && s.ends_with(']') {
        match serde_yaml::from_str::<Vec<serde_yaml::Value>>(s) {
            Ok(items) => {
                let scalars: Option<Vec<String>> = items.iter().map(scalar_to_string).collect();
                if let Some(items) = scalars {
                    return items.into_iter().filter(|i| !i.is_empty()).collect();
                }
                tracing::warn!(value = s, "list tag has nested items, splitting on delimiters");
            }
            Err(err) => {
                tracing::warn!(value = s, %err, "list tag is not a valid flow list, splitting on delimiters");
            }
        }
    }
    RE_LIST_SPLIT
        .split(s)
        .map(|p| p.trim_matches(|c: char| c == '[' || c == ']' || c.is_whitespace()))
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn scalar_to_string(v: &serde_yaml::Value) -> Option<String> {
    match v {
        serde_yaml::Value::String(s) => Some(s.trim().to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Null => Some(String::new()),
        _ => None,
    }
}

/// An access label at depth zero of a class body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLabel {
    pub visibility: Visibility,
    /// Start of the label keyword.
    pub start: usize,
    /// Just past the `:`.
    pub end: usize,
    /// Trailing comment on the same line, if any.
    pub comment: Option<String>,
    /// Nothing but whitespace precedes the label on its line.
    pub own_line: bool,
}

impl AccessLabel {
    /// Whether the trailing comment names `tag` as a whole word, in any case.
    pub fn carries_tag(&self, tag: &str) -> bool {
        let Some(comment) = &self.comment else {
            return false;
        };
        let pattern = format!(r"(?i)\b{}\b", regex::escape(tag));
        Regex::new(&pattern).is_ok_and(|re| re.is_match(comment))
    }
}

/// Access labels directly inside `body` (a range of `text`), top to bottom.
///
/// `masked` must be [`mask_non_code`] of `text`. Labels inside nested
/// braces belong to nested types and are ignored.
pub fn access_labels(text: &str, masked: &str, body: Range<usize>) -> Vec<AccessLabel> {
    let depth_zero = depth_zero_mask(masked, body.clone());
    let mut labels = Vec::new();

    for caps in RE_ACCESS_LABEL.captures_iter(&masked[body.clone()]) {
        let (Some(whole), Some(word)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let start = body.start + whole.start();
        let end = body.start + whole.end();
        if masked[end..].starts_with(':') || !depth_zero[whole.start()] {
            continue;
        }
        let Some(visibility) = Visibility::parse(word.as_str()) else {
            continue;
        };

        let tail = text[end..line_end(text, end)].trim();
        let comment = if tail.starts_with("//") || tail.starts_with("/*") {
            Some(tail.to_string())
        } else {
            None
        };
        let own_line = text[line_start(text, start)..start].trim().is_empty();

        labels.push(AccessLabel {
            visibility,
            start,
            end,
            comment,
            own_line,
        });
    }
    labels
}

/// For each byte of the body, whether it sits at brace depth zero.
fn depth_zero_mask(masked: &str, body: Range<usize>) -> Vec<bool> {
    let mut depth = 0usize;
    masked.as_bytes()[body]
        .iter()
        .map(|&b| {
            match b {
                b'{' => depth += 1,
                b'}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            depth == 0
        })
        .collect()
}
