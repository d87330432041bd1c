//! Doxygen `@brief` annotator.
//!
//! Puts a `/** @brief ... */` block above member declarations picked by
//! name or pattern. Declarations that already carry a `/**` block are left
//! alone unless overwriting is requested.

use crate::annotation::brief_block;
use crate::decl::{enclosing_scope, find_candidates, NameQuery, ScopeKind};
use crate::patch::{apply, FilePatcher, Splice};
use crate::text::{indent_of, line_start, mask_non_code, non_code_regions, Region, RegionKind};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

/// One `--func "Name:Brief"` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub brief: String,
}

impl Target {
    /// `Name:Brief text`; without `:` the brief is `Name function`.
    pub fn parse(arg: &str) -> Self {
        match arg.split_once(':') {
            Some((name, brief)) => Target {
                name: name.trim().to_string(),
                brief: brief.trim().to_string(),
            },
            None => Target {
                name: arg.trim().to_string(),
                brief: format!("{} function", arg.trim()),
            },
        }
    }
}

/// Where the annotated text goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
    InPlace { backup: bool },
}

/// Pipeline configuration for [`annotate`] and [`run`].
#[derive(Debug, Clone)]
pub struct AnnotateConfig {
    pub header: PathBuf,
    pub targets: Vec<Target>,
    /// Target names are regular expressions matched against whole identifiers.
    pub use_regex: bool,
    /// Also annotate namespace-scope and top-level declarations.
    pub include_free: bool,
    pub overwrite_comments: bool,
    pub destination: Destination,
}

/// Annotate `text`; returns the new text and the number of blocks written.
pub fn annotate(text: &str, config: &AnnotateConfig) -> Result<(String, usize)> {
    let masked = mask_non_code(text);
    let doc_blocks: Vec<Region> = non_code_regions(text)
        .into_iter()
        .filter(|r| r.kind == RegionKind::BlockComment && text[r.start..].starts_with("/**"))
        .collect();

    let mut seen = HashSet::new();
    let mut splices = Vec::new();

    for target in &config.targets {
        let query = if config.use_regex {
            NameQuery::pattern(&target.name)
                .with_context(|| format!("invalid function pattern: {}", target.name))?
        } else {
            NameQuery::exact(&target.name)
        };

        for candidate in find_candidates(&masked, &query) {
            let start = candidate.range.start;
            if !candidate.is_declaration() || candidate.prefix.contains('=') || seen.contains(&start) {
                continue;
            }
            match enclosing_scope(&masked, start) {
                ScopeKind::Class => {}
                ScopeKind::TopLevel | ScopeKind::Namespace if config.include_free => {}
                _ => continue,
            }

            let line = line_start(text, start);
            if !text[line..start].trim().is_empty() {
                tracing::debug!(name = %candidate.name, "declaration shares its line, skipped");
                continue;
            }
            seen.insert(start);

            let indent = indent_of(&text[line..]);
            let block = brief_block(indent, &target.brief);
            match doc_block_above(text, &doc_blocks, line) {
                Some(existing) if config.overwrite_comments => {
                    let block_line = line_start(text, existing.start);
                    if !text[block_line..existing.start].trim().is_empty() {
                        tracing::debug!(name = %candidate.name, "doc block shares its line, skipped");
                        continue;
                    }
                    splices.push(Splice::replace(block_line..line, block));
                }
                Some(_) => {
                    tracing::debug!(name = %candidate.name, "already documented");
                }
                None => splices.push(Splice::insert(line, block)),
            }
        }
    }

    let count = splices.len();
    Ok((apply(text, &splices)?, count))
}

/// The `/**` block separated from the line at `line` only by whitespace.
fn doc_block_above<'a>(text: &str, blocks: &'a [Region], line: usize) -> Option<&'a Region> {
    blocks
        .iter()
        .take_while(|b| b.end <= line)
        .last()
        .filter(|b| text[b.end..line].trim().is_empty())
}

/// Read the header, annotate, and write to the configured destination.
pub fn run(config: &AnnotateConfig) -> Result<usize> {
    let text = fs::read_to_string(&config.header)
        .with_context(|| format!("Failed to read {}", config.header.display()))?;
    let (updated, count) = annotate(&text, config)?;
    tracing::info!(count, header = %config.header.display(), "declarations annotated");

    match &config.destination {
        Destination::Stdout => print!("{updated}"),
        Destination::File(path) => {
            FilePatcher::new(false, false).write(path, &updated)?;
            println!("[OK] Wrote: {}", path.display());
        }
        Destination::InPlace { backup } => {
            FilePatcher::new(*backup, false).write_with_backup(&config.header, &text, &updated)?;
            println!("[OK] Updated in place: {}", config.header.display());
        }
    }
    Ok(count)
}
