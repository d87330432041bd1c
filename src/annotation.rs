//! Synthesized comment blocks.

use crate::model::{Durability, TagType};

/// Metadata for the tag block written above an inserted member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationSpec {
    pub tag_type: TagType,
    pub name: String,
    pub description: String,
    /// Command only.
    pub allowed_modes: Vec<String>,
    /// Command only.
    pub emit: Vec<String>,
    /// Event only.
    pub durability: Durability,
    /// Event only.
    pub causation: Vec<String>,
}

impl AnnotationSpec {
    /// Render the `/** ... */` block, newline-terminated, unindented.
    pub fn render_block(&self) -> String {
        let mut lines = vec![
            format!("@type: {}", self.tag_type),
            format!("@command: {}", self.name),
        ];
        match self.tag_type {
            TagType::Command => {
                lines.push(format!("@allowed_modes: {}", flow_list(&self.allowed_modes)));
                lines.push(format!("@emit: {}", flow_list(&self.emit)));
            }
            TagType::Event => {
                lines.push(format!("@durability: {}", self.durability));
                lines.push(format!("@causation: {}", flow_list(&self.causation)));
            }
        }
        lines.push(format!("@description: {}", self.description.trim()));

        let mut out = String::from("/**\n");
        for line in lines {
            out.push_str(" * ");
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out.push_str(" */\n");
        out
    }
}

/// `[a,b]` with no spaces, the form this tool writes.
pub fn flow_list(items: &[String]) -> String {
    format!("[{}]", items.join(","))
}

/// Flatten CLI list arguments: each value may itself be `a,b` or `[a, b]`.
pub fn normalize_list_arg(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| {
            let v = v.trim();
            let v = v.strip_prefix('[').unwrap_or(v);
            let v = v.strip_suffix(']').unwrap_or(v);
            v.split(',').map(str::trim).filter(|p| !p.is_empty()).map(str::to_string).collect::<Vec<_>>()
        })
        .collect()
}

/// Doxygen `@brief` block, one line per element, each indented.
pub fn brief_block(indent: &str, brief: &str) -> String {
    format!("{indent}/**\n{indent} * @brief {}\n{indent} */\n", brief.trim())
}
