//! Insertion pipeline: declaration into the header, stub into the source.
//!
//! Every read happens before any write. A class that cannot be located
//! aborts the run before anything is written. Each side is skipped on its
//! own when it already holds the member. Header and source writes are not
//! transactional: if the source write fails after the header was written,
//! the header change stays.

use crate::annotation::AnnotationSpec;
use crate::class_body::find_class_bounds;
use crate::duplicate::{declaration_exists, definition_exists};
use crate::model::Visibility;
use crate::patch::{apply, FilePatcher};
use crate::placement::{self, Insertion};
use crate::signature::{strip_defaults, Signature};
use crate::tags::access_labels;
use crate::text::{find_top_level, mask_non_code};
use anyhow::{bail, Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Qualifiers that may only appear on the in-class declaration.
const DECLARATION_ONLY: [&str; 2] = ["override", "final"];

/// Pipeline configuration for [`run`].
#[derive(Debug, Clone)]
pub struct InsertConfig {
    pub header: PathBuf,
    pub source: PathBuf,
    /// Include written into a newly created source; defaults to the header's
    /// file name.
    pub include: Option<String>,
    pub class_name: String,
    pub function: String,
    pub return_type: String,
    pub params: String,
    pub qualifiers: String,
    pub namespace: String,
    pub class_prefix: String,
    pub annotation: AnnotationSpec,
    pub also_comment_in_source: bool,
    pub backup: bool,
    pub dry_run: bool,
}

impl InsertConfig {
    /// `ret name(params) quals`, without `;`.
    pub fn declaration(&self) -> String {
        let mut decl = format!("{} {}({})", self.return_type.trim(), self.function.trim(), self.params.trim());
        if !self.qualifiers.trim().is_empty() {
            decl.push(' ');
            decl.push_str(self.qualifiers.trim());
        }
        decl
    }

    /// `ns::prefix::Class::function`, empty parts skipped.
    pub fn qualified_name(&self) -> String {
        let mut parts: Vec<&str> = [self.namespace.trim(), self.class_prefix.trim()]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();
        parts.push(self.class_name.trim());
        parts.push(self.function.trim());
        parts.join("::")
    }

    pub fn include_name(&self) -> String {
        self.include.clone().unwrap_or_else(|| {
            self.header
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }

    /// Qualifiers legal on an out-of-line definition; a `= 0`, `= default`
    /// or `= delete` clause is dropped too.
    fn definition_qualifiers(&self) -> String {
        let quals = match find_top_level(&self.qualifiers, '=') {
            Some(eq) => &self.qualifiers[..eq],
            None => self.qualifiers.as_str(),
        };
        quals
            .split_whitespace()
            .filter(|q| !DECLARATION_ONLY.contains(q))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `ns::Class::function(params) quals` with defaults removed.
    pub fn definition_head(&self) -> String {
        let mut head = format!("{}({})", self.qualified_name(), strip_defaults(&self.params));
        let quals = self.definition_qualifiers();
        if !quals.is_empty() {
            head.push(' ');
            head.push_str(&quals);
        }
        head
    }

    fn declaration_signature(&self) -> Signature {
        Signature::from_parts(&self.return_type, &self.function, &self.params, &self.qualifiers)
    }

    fn definition_signature(&self) -> Signature {
        Signature::from_parts(
            &self.return_type,
            &self.qualified_name(),
            &self.params,
            &self.definition_qualifiers(),
        )
    }

    fn returns_void(&self) -> bool {
        self.return_type.trim() == "void"
    }
}

/// What a run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertReport {
    pub header_changed: bool,
    pub source_changed: bool,
    pub source_created: bool,
}

/// New header text, or `None` when the declaration already exists.
///
/// Fails if the class cannot be located.
pub fn plan_header(text: &str, config: &InsertConfig) -> Result<Option<String>> {
    let masked = mask_non_code(text);
    let Some(bounds) = find_class_bounds(&masked, &config.class_name) else {
        bail!(
            "class '{}' not found in {}",
            config.class_name,
            config.header.display()
        );
    };

    let target = config.declaration_signature();
    if declaration_exists(&masked[bounds.body_range()], &target) {
        return Ok(None);
    }

    let labels = access_labels(text, &masked, bounds.body_range());
    let tag = config.annotation.tag_type.as_str();
    let point = placement::select(&labels, Visibility::Public, tag);
    tracing::debug!(mode = ?point.mode, class = %config.class_name, "insertion point selected");

    let block = config.annotation.render_block();
    let declaration = config.declaration();
    let insertion = Insertion {
        block: &block,
        declaration: &declaration,
        visibility: Visibility::Public,
        tag,
    };
    let splice = placement::plan(text, &bounds, &labels, &point, &insertion);
    apply(text, &[splice]).map(Some)
}

/// New source text, or `None` when the definition already exists.
///
/// `existing` is `None` when the source file does not exist yet; it is
/// then started with an include of the header.
pub fn plan_source(existing: Option<&str>, config: &InsertConfig) -> Option<String> {
    let mut src = match existing {
        Some(text) => text.to_string(),
        None => format!("#include \"{}\"\n", config.include_name()),
    };

    let head = config.definition_head();
    if definition_exists(&src, &config.definition_signature(), &head) {
        return None;
    }

    if !src.is_empty() && !src.ends_with('\n') {
        src.push('\n');
    }
    src.push('\n');
    if config.also_comment_in_source {
        src.push_str(&config.annotation.render_block());
    }
    src.push_str(&format!("{} {} {{\n", config.return_type.trim(), head));
    if !config.returns_void() {
        src.push_str("    return {};\n");
    }
    src.push_str("}\n");
    Some(src)
}

/// Run the whole insertion against the files named in `config`.
pub fn run(config: &InsertConfig) -> Result<InsertReport> {
    let header_text = fs::read_to_string(&config.header)
        .with_context(|| format!("Failed to read {}", config.header.display()))?;
    let source_text = read_optional(&config.source)?;

    let header_update = plan_header(&header_text, config)?;
    let source_update = plan_source(source_text.as_deref(), config);

    let mut patcher = FilePatcher::new(config.backup, config.dry_run);
    let verb = if config.dry_run { "Would insert" } else { "Inserted" };
    let mut report = InsertReport::default();

    match header_update {
        Some(updated) => {
            patcher.write_with_backup(&config.header, &header_text, &updated)?;
            println!("[OK] {verb} declaration into header: {}", config.header.display());
            report.header_changed = true;
        }
        None => {
            tracing::info!(
                header = %config.header.display(),
                "header already contains the same declaration, skipped header insert"
            );
        }
    }

    match source_update {
        Some(updated) => {
            patcher.write(&config.source, &updated)?;
            let verb = if config.dry_run { "Would add" } else { "Added" };
            println!("[OK] {verb} definition to source: {}", config.source.display());
            report.source_changed = true;
            report.source_created = source_text.is_none();
        }
        None => {
            tracing::info!(
                source = %config.source.display(),
                "source already contains the same definition, skipped source insert"
            );
        }
    }

    Ok(report)
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("Failed to read {}", path.display())),
    }
}
