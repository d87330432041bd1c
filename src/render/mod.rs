//! Renderer module: trait-based manifest format dispatch.

pub mod json;
pub mod yaml;

use crate::model::Manifest;
use anyhow::{anyhow, Result};

/// Trait for rendering a [`Manifest`] into a specific output format.
pub trait Renderer {
    fn render(&self, manifest: &Manifest) -> Result<String>;
    fn file_extension(&self) -> &str;
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str) -> Result<Box<dyn Renderer>> {
    match format {
        "yaml" | "yml" => Ok(Box::new(yaml::YamlRenderer)),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(anyhow!("unknown format: {}. Use yaml or json", format)),
    }
}
