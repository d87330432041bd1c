//! JSON renderer for tooling that prefers it over YAML.

use crate::model::Manifest;
use crate::render::Renderer;
use anyhow::{Context, Result};

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, manifest: &Manifest) -> Result<String> {
        let mut out = serde_json::to_string_pretty(manifest).context("failed to serialize manifest as JSON")?;
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommandRecord, Request};

    #[test]
    fn request_type_key_is_renamed() {
        let manifest = Manifest {
            version: 2,
            modes: vec!["normal".to_string()],
            subsystem: "radio".to_string(),
            commands: vec![CommandRecord {
                id: "cmd.radio.send".to_string(),
                name: "Send".to_string(),
                allowed_modes: vec!["normal".to_string()],
                request: Request {
                    type_name: "int".to_string(),
                },
                emit: Vec::new(),
                description: String::new(),
            }],
        };
        let out = JsonRenderer.render(&manifest).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["version"], 2);
        assert_eq!(value["commands"][0]["request"]["type"], "int");
        assert!(out.ends_with("}\n"));
    }
}
