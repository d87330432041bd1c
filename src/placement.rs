//! Insertion-point selection inside a located class body.
//!
//! Priority is `tagged` > `plain` > `none`, first match in file order:
//!
//! - **tagged**: a label of the requested visibility whose trailing comment
//!   names the tag type. The member goes on the line right below it.
//! - **plain**: no tagged label, but a bare one of that visibility exists.
//!   A new tagged section is opened directly above it; the bare label and
//!   everything under it stay untouched.
//! - **none**: no label of that visibility. A tagged section is opened right
//!   after the class's `{` and the class-key default visibility is
//!   re-opened behind it.

use crate::class_body::ClassBounds;
use crate::model::Visibility;
use crate::patch::Splice;
use crate::tags::AccessLabel;
use crate::text::{indent_block, indent_of, indent_unit, line_start, next_line_start};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionMode {
    Tagged,
    Plain,
    None,
}

/// The selected mode and the label it refers to, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionPoint {
    pub mode: InsertionMode,
    pub label: Option<AccessLabel>,
}

/// Pick where a member tagged `tag` of `visibility` should go.
pub fn select(labels: &[AccessLabel], visibility: Visibility, tag: &str) -> InsertionPoint {
    let mut plain: Option<&AccessLabel> = None;
    for label in labels.iter().filter(|l| l.visibility == visibility) {
        if label.carries_tag(tag) {
            return InsertionPoint {
                mode: InsertionMode::Tagged,
                label: Some(label.clone()),
            };
        }
        if plain.is_none() {
            plain = Some(label);
        }
    }
    match plain {
        Some(label) => InsertionPoint {
            mode: InsertionMode::Plain,
            label: Some(label.clone()),
        },
        None => InsertionPoint {
            mode: InsertionMode::None,
            label: None,
        },
    }
}

/// What to insert and how to label a new section.
pub struct Insertion<'a> {
    /// Unindented tag block, newline-terminated.
    pub block: &'a str,
    /// Declaration without its `;`.
    pub declaration: &'a str,
    pub visibility: Visibility,
    pub tag: &'a str,
}

/// Build the single splice that places `insertion` at `point`.
pub fn plan(
    text: &str,
    bounds: &ClassBounds,
    labels: &[AccessLabel],
    point: &InsertionPoint,
    insertion: &Insertion,
) -> Splice {
    let base = indent_of(&text[line_start(text, bounds.keyword_start)..]).to_string();
    let unit = indent_unit(&text[bounds.body_range()]);
    let label_indent = labels
        .iter()
        .find(|l| l.own_line)
        .map(|l| indent_of(&text[line_start(text, l.start)..]).to_string())
        .unwrap_or_else(|| base.clone());
    let fallback = format!("{label_indent}{unit}");
    let header = format!(
        "{}: // {}\n",
        insertion.visibility.as_str(),
        insertion.tag
    );

    let member = |indent: &str| {
        format!(
            "{}{indent}{};\n",
            indent_block(insertion.block, indent),
            insertion.declaration
        )
    };

    match (point.mode, &point.label) {
        (InsertionMode::Tagged, Some(label)) => {
            let pos = next_line_start(text, label.end);
            let indent = member_indent(text, bounds, pos, &fallback);
            if pos > bounds.close {
                // Label shares its line with the closing brace
                return Splice::insert(bounds.close, format!("\n\n{}{base}", member(&indent)));
            }
            Splice::insert(pos, format!("\n{}", member(&indent)))
        }
        (InsertionMode::Plain, Some(label)) if label.own_line => {
            let pos = line_start(text, label.start);
            let own = indent_of(&text[pos..]).to_string();
            let indent = member_indent(text, bounds, next_line_start(text, label.end), &format!("{own}{unit}"));
            Splice::insert(pos, format!("{own}{header}\n{}", member(&indent)))
        }
        (InsertionMode::Plain, Some(label)) => {
            // Label shares its line with earlier text: move it to a new line
            let ws_start = text[..label.start].trim_end_matches([' ', '\t']).len();
            let indent = member_indent(text, bounds, next_line_start(text, label.end), &fallback);
            Splice::replace(
                ws_start..label.start,
                format!("\n{label_indent}{header}\n{}{label_indent}", member(&indent)),
            )
        }
        _ => {
            let body = bounds.body_range();
            let indent = member_indent(text, bounds, body.start, &fallback);
            let section = format!("\n{label_indent}{header}\n{}", member(&indent));
            if text[body.clone()].trim().is_empty() {
                return Splice::replace(body, format!("{section}{base}"));
            }
            let reopen = bounds.key.default_visibility().as_str();
            Splice::insert(body.start, format!("{section}{label_indent}{reopen}:"))
        }
    }
}

/// Indentation of the nearest member line at or after `from`, else of the
/// first member line in the body, else `fallback`.
fn member_indent(text: &str, bounds: &ClassBounds, from: usize, fallback: &str) -> String {
    let body = bounds.body_range();
    first_member_indent(text, from, body.end)
        .or_else(|| first_member_indent(text, body.start, body.end))
        .unwrap_or_else(|| fallback.to_string())
}

fn first_member_indent(text: &str, from: usize, to: usize) -> Option<String> {
    // Only whole lines count; the remainder of the `{` line is skipped
    let from = if from == 0 || text.as_bytes().get(from - 1) == Some(&b'\n') {
        from
    } else {
        next_line_start(text, from)
    };
    if from >= to {
        return None;
    }
    text[from..to]
        .lines()
        .find(|line| {
            let t = line.trim();
            !t.is_empty() && !t.starts_with('}') && !is_label_line(t)
        })
        .map(|line| indent_of(line).to_string())
}

fn is_label_line(trimmed: &str) -> bool {
    ["public", "protected", "private"].iter().any(|kw| {
        trimmed
            .strip_prefix(kw)
            .is_some_and(|rest| rest.trim_start().starts_with(':') && !rest.trim_start().starts_with("::"))
    })
}
