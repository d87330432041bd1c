//! Text primitives shared by every scanner.
//!
//! All helpers work on byte offsets into the original buffer. The central
//! piece is [`mask_non_code`], which produces a same-length copy of a file
//! with comments, literals and preprocessor lines blanked out, so brace,
//! parenthesis and name scans can run over the mask and still report
//! offsets that are valid in the original text.

use regex::Regex;
use std::sync::LazyLock;

static RE_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[[^\]]*\]\]\s*").unwrap());
static RE_BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static RE_LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"//[^\n]*").unwrap());
static RE_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Kind of a non-code region found by [`non_code_regions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    LineComment,
    BlockComment,
    Literal,
    Preprocessor,
}

/// A byte range of the input that is not C++ code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    pub start: usize,
    pub end: usize,
}

/// Find comments, string/char literals and preprocessor lines, in order.
///
/// Unterminated block comments and literals run to the end of the input
/// (literals stop at the end of their line).
pub fn non_code_regions(text: &str) -> Vec<Region> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let len = text.len();
    let at = |i: usize| chars.get(i).map(|&(_, c)| c);
    let offset = |i: usize| chars.get(i).map(|&(o, _)| o).unwrap_or(len);

    let mut regions = Vec::new();
    let mut at_line_start = true;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i].1;
        let start = chars[i].0;

        if c == '/' && at(i + 1) == Some('/') {
            let mut j = i;
            while j < chars.len() && chars[j].1 != '\n' {
                j += 1;
            }
            regions.push(Region {
                kind: RegionKind::LineComment,
                start,
                end: offset(j),
            });
            i = j;
            continue;
        }

        if c == '/' && at(i + 1) == Some('*') {
            let mut j = i + 2;
            while j < chars.len() && !(chars[j].1 == '*' && at(j + 1) == Some('/')) {
                j += 1;
            }
            let j = (j + 2).min(chars.len());
            regions.push(Region {
                kind: RegionKind::BlockComment,
                start,
                end: offset(j),
            });
            at_line_start = false;
            i = j;
            continue;
        }

        if c == '"' || c == '\'' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].1 != c && chars[j].1 != '\n' {
                if chars[j].1 == '\\' && at(j + 1).is_some_and(|n| n != '\n') {
                    j += 2;
                    continue;
                }
                j += 1;
            }
            if at(j) == Some(c) {
                j += 1;
            }
            regions.push(Region {
                kind: RegionKind::Literal,
                start,
                end: offset(j),
            });
            at_line_start = false;
            i = j;
            continue;
        }

        if c == '#' && at_line_start {
            let mut j = i;
            while j < chars.len() && chars[j].1 != '\n' {
                // Backslash-newline continues the directive
                if chars[j].1 == '\\' && at(j + 1) == Some('\n') {
                    j += 2;
                    continue;
                }
                j += 1;
            }
            regions.push(Region {
                kind: RegionKind::Preprocessor,
                start,
                end: offset(j),
            });
            i = j;
            continue;
        }

        if c == '\n' {
            at_line_start = true;
        } else if !c.is_whitespace() {
            at_line_start = false;
        }
        i += 1;
    }

    regions
}

/// Same-length copy of `text` with every non-code region blanked.
///
/// Newlines survive so line arithmetic on the mask matches the original.
pub fn mask_non_code(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for region in non_code_regions(text) {
        out.push_str(&text[cursor..region.start]);
        for c in text[region.start..region.end].chars() {
            if c == '\n' {
                out.push('\n');
            } else {
                out.extend(std::iter::repeat(' ').take(c.len_utf8()));
            }
        }
        cursor = region.end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Remove `[[...]]` attributes.
pub fn strip_attributes(s: &str) -> String {
    RE_ATTRIBUTE.replace_all(s, "").into_owned()
}

/// Remove block and line comments.
pub fn strip_comments(s: &str) -> String {
    let s = RE_BLOCK_COMMENT.replace_all(s, " ");
    RE_LINE_COMMENT.replace_all(&s, "").into_owned()
}

/// Trim and collapse every whitespace run to a single space.
pub fn collapse_ws(s: &str) -> String {
    RE_WS.replace_all(s.trim(), " ").into_owned()
}

/// Comments, attributes and irregular whitespace removed.
pub fn strip_noise(s: &str) -> String {
    collapse_ws(&strip_attributes(&strip_comments(s)))
}

/// [`strip_noise`] followed by removal of all remaining whitespace.
pub fn squash(s: &str) -> String {
    strip_attributes(&strip_comments(s))
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Split on `sep` only where no `()`, `[]`, `{}` or `<>` group is open.
///
/// A stray closing bracket never drives the depth below zero.
pub fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut last = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' | '>' => depth = depth.saturating_sub(1),
            _ if c == sep && depth == 0 => {
                parts.push(&s[last..i]);
                last = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[last..]);
    parts
}

/// Byte offset of the first `c` outside any bracket group.
pub fn find_top_level(s: &str, target: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        if c == target && depth == 0 {
            return Some(i);
        }
        match c {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' | '>' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

/// Offset of the bracket closing the one at `open`.
///
/// Plain depth counter over a linear scan; `None` when the input ends
/// before depth returns to zero.
pub fn find_matching(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let (o, c) = match bytes.get(open)? {
        b'(' => (b'(', b')'),
        b'{' => (b'{', b'}'),
        b'[' => (b'[', b']'),
        _ => return None,
    };
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if b == o {
            depth += 1;
        } else if b == c {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Offset of the first byte of the line containing `pos`.
pub fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map_or(0, |i| i + 1)
}

/// Offset of the newline ending the line containing `pos` (or `text.len()`).
pub fn line_end(text: &str, pos: usize) -> usize {
    text[pos..].find('\n').map_or(text.len(), |i| pos + i)
}

/// Offset just past the newline ending the line containing `pos`.
pub fn next_line_start(text: &str, pos: usize) -> usize {
    text[pos..].find('\n').map_or(text.len(), |i| pos + i + 1)
}

/// Leading spaces and tabs of a line.
pub fn indent_of(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

/// One level of indentation in the style of `sample`.
pub fn indent_unit(sample: &str) -> &'static str {
    if sample.contains('\t') {
        "\t"
    } else {
        "    "
    }
}

/// Prefix every non-blank line of `block` with `indent`.
pub fn indent_block(block: &str, indent: &str) -> String {
    block
        .split_inclusive('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect()
}

pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// True if `s` is a plain identifier (no scope operator).
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(is_ident_char),
        _ => false,
    }
}

/// Largest char boundary not greater than `idx`.
pub fn floor_boundary(s: &str, idx: usize) -> usize {
    let mut idx = idx.min(s.len());
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
