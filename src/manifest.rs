//! Manifest builder: tagged command declarations to [`Manifest`] records.

use crate::model::{CommandRecord, Manifest, Request, TagType, DEFAULT_MODES};
use crate::signature::{canonical_params, display_type};
use crate::tags::{self, TaggedDeclaration};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static RE_UPPER_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(.)([A-Z][a-z]+)").unwrap());
static RE_LOWER_UPPER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());
static RE_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s\-]+").unwrap());

/// Pipeline configuration for [`build`].
#[derive(Debug, Clone)]
pub struct ManifestConfig {
    pub version: u32,
    /// Top-level modes; also the default `allowed_modes` of every command.
    pub modes: Vec<String>,
    pub subsystem: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        ManifestConfig {
            version: 1,
            modes: DEFAULT_MODES.iter().map(|m| m.to_string()).collect(),
            subsystem: "default".to_string(),
        }
    }
}

/// Scan `text` for command blocks and build the manifest.
pub fn build(text: &str, config: &ManifestConfig) -> Manifest {
    let commands = tags::scan(text, TagType::Command)
        .iter()
        .map(|decl| record(decl, config))
        .collect::<Vec<_>>();
    tracing::debug!(count = commands.len(), "commands extracted");

    Manifest {
        version: config.version,
        modes: config.modes.clone(),
        subsystem: config.subsystem.clone(),
        commands,
    }
}

fn record(decl: &TaggedDeclaration, config: &ManifestConfig) -> CommandRecord {
    tracing::debug!(name = %decl.name, declaration = %decl.declaration, "command found");
    // Only a missing or blank tag takes the defaults; `[]` stays empty
    let allowed_modes = match decl.block.tag("allowed_modes").map(str::trim) {
        Some(raw) if !raw.is_empty() => decl.block.list("allowed_modes"),
        _ => config.modes.clone(),
    };
    let request_type = canonical_params(&decl.params)
        .first()
        .map(|t| display_type(t))
        .unwrap_or_else(|| "void".to_string());

    CommandRecord {
        id: command_id(&config.subsystem, &decl.name),
        name: decl.name.clone(),
        allowed_modes,
        request: Request {
            type_name: request_type,
        },
        emit: decl.block.list("emit"),
        description: decl.block.tag("description").unwrap_or_default().to_string(),
    }
}

/// `CamelCase` -> `camel_case`, `HTTPServer` -> `http_server`.
pub fn snake_case(name: &str) -> String {
    let s = RE_UPPER_WORD.replace_all(name, "${1}_${2}");
    let s = RE_LOWER_UPPER.replace_all(&s, "${1}_${2}");
    RE_SEPARATORS.replace_all(&s, "_").to_lowercase()
}

/// `cmd.<snake_subsystem>.<snake_name>`; a blank subsystem is `default`.
pub fn command_id(subsystem: &str, name: &str) -> String {
    let subsystem = match subsystem.trim() {
        "" => "default",
        s => s,
    };
    format!("cmd.{}.{}", snake_case(subsystem), snake_case(name))
}

/// Explicit subsystem if non-blank, else the header's file stem.
pub fn resolve_subsystem(explicit: Option<&str>, header: &Path) -> String {
    if let Some(s) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        return s.to_string();
    }
    header
        .file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "default".to_string())
}

/// Comma-separated mode list, blanks dropped.
pub fn parse_modes(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

/// `<stem>_command.<ext>` in the current directory.
pub fn default_output_path(header: &Path, ext: &str) -> PathBuf {
    let stem = header
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "manifest".to_string());
    PathBuf::from(format!("{stem}_command.{ext}"))
}
