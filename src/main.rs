//! cmdtag: maintain `@type: command` / `@type: event` annotations in C++
//! class headers.
//!
//! Three subcommands:
//!
//! - **manifest**: scan a header's tagged command declarations and write a
//!   YAML (or JSON) manifest
//! - **insert**: add a tagged member declaration to a class and a stub
//!   definition to its source file, idempotently
//! - **annotate**: put Doxygen `@brief` blocks above chosen declarations

mod annotate;
mod annotation;
mod class_body;
mod decl;
mod duplicate;
mod insert;
mod manifest;
mod model;
mod patch;
mod placement;
mod render;
mod signature;
mod tags;
mod text;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use model::{Durability, TagType, DEFAULT_MODES};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cmdtag", about = "Extract and insert command/event annotations in C++ headers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a command manifest from a header's tagged declarations
    Manifest {
        /// Input header
        header: PathBuf,

        /// Output file, `-` for stdout (default: <header-stem>_command.<ext>)
        #[arg(short = 'o', long)]
        output: Option<String>,

        /// Manifest version number
        #[arg(long = "version", default_value_t = 1)]
        manifest_version: u32,

        /// Subsystem name (default: header file stem)
        #[arg(long)]
        subsystem: Option<String>,

        /// Default modes, comma-separated
        #[arg(long, default_value_t = DEFAULT_MODES.join(","))]
        modes: String,

        /// Output format: yaml (default) or json
        #[arg(short = 'f', long, default_value = "yaml")]
        format: String,
    },
    /// Insert a tagged declaration into a class and a stub into its source
    Insert {
        /// Header containing the class
        #[arg(long)]
        header: PathBuf,

        /// Source file for the stub definition (created if missing)
        #[arg(long)]
        source: PathBuf,

        /// Include name for a new source file (default: header file name)
        #[arg(long)]
        include: Option<String>,

        /// Target class or struct
        #[arg(long = "class")]
        class_name: String,

        /// Function name
        #[arg(short = 'f', long = "function-name")]
        function: String,

        #[arg(long, default_value = "void")]
        return_type: String,

        /// Parameter list without parentheses
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        params: String,

        /// Trailing qualifiers, e.g. "const noexcept"
        #[arg(long, default_value = "")]
        qualifiers: String,

        /// Namespace for the qualified definition name
        #[arg(long, default_value = "")]
        ns: String,

        /// Extra scope between namespace and class
        #[arg(long, default_value = "")]
        class_prefix: String,

        /// Annotation type
        #[arg(long = "type", value_enum, default_value_t = TagType::Command)]
        tag_type: TagType,

        #[arg(long, default_value = "")]
        description: String,

        /// Allowed modes (command)
        #[arg(long, num_args = 0..)]
        allowed_modes: Vec<String>,

        /// Emitted events (command)
        #[arg(long, num_args = 0..)]
        emit: Vec<String>,

        /// Durability (event)
        #[arg(long, value_enum, default_value_t = Durability::Volatile)]
        durability: Durability,

        /// Causing commands (event)
        #[arg(long, num_args = 0..)]
        causation: Vec<String>,

        /// Also put the annotation block above the source stub
        #[arg(long)]
        also_comment_in_cpp: bool,

        /// Do not write a .bak copy of the header
        #[arg(long)]
        no_backup: bool,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Insert Doxygen @brief blocks above matching declarations
    Annotate {
        /// Header to annotate
        header: PathBuf,

        /// Target as "Name:Brief text" (repeatable); without ":Brief" uses "Name function"
        #[arg(long = "func", required = true)]
        funcs: Vec<String>,

        /// Treat names as regular expressions over whole identifiers
        #[arg(long)]
        regex: bool,

        /// Also annotate free (namespace-scope) functions
        #[arg(long)]
        include_free: bool,

        /// Replace an existing /** */ block instead of skipping
        #[arg(long)]
        overwrite_comments: bool,

        /// Edit the header in place
        #[arg(long, conflicts_with = "output")]
        in_place: bool,

        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// With --in-place, do not write a .bak copy
        #[arg(long)]
        no_backup: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "cmdtag=debug" } else { "cmdtag=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Manifest {
            header,
            output,
            manifest_version,
            subsystem,
            modes,
            format,
        } => {
            let text = fs::read_to_string(&header)
                .with_context(|| format!("Failed to read {}", header.display()))?;
            let config = manifest::ManifestConfig {
                version: manifest_version,
                modes: manifest::parse_modes(&modes),
                subsystem: manifest::resolve_subsystem(subsystem.as_deref(), &header),
            };
            let renderer = render::create_renderer(&format)?;
            let rendered = renderer.render(&manifest::build(&text, &config))?;

            match output.as_deref() {
                Some("-") => print!("{rendered}"),
                other => {
                    let path = other
                        .map(PathBuf::from)
                        .unwrap_or_else(|| manifest::default_output_path(&header, renderer.file_extension()));
                    fs::write(&path, &rendered)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("[OK] manifest written: {}", path.display());
                }
            }
        }
        Commands::Insert {
            header,
            source,
            include,
            class_name,
            function,
            return_type,
            params,
            qualifiers,
            ns,
            class_prefix,
            tag_type,
            description,
            allowed_modes,
            emit,
            durability,
            causation,
            also_comment_in_cpp,
            no_backup,
            dry_run,
        } => {
            let annotation = annotation::AnnotationSpec {
                tag_type,
                name: function.clone(),
                description,
                allowed_modes: annotation::normalize_list_arg(&allowed_modes),
                emit: annotation::normalize_list_arg(&emit),
                durability,
                causation: annotation::normalize_list_arg(&causation),
            };
            let config = insert::InsertConfig {
                header,
                source,
                include,
                class_name,
                function,
                return_type,
                params,
                qualifiers,
                namespace: ns,
                class_prefix,
                annotation,
                also_comment_in_source: also_comment_in_cpp,
                backup: !no_backup,
                dry_run,
            };
            let report = insert::run(&config)?;
            if report.source_created {
                tracing::debug!(source = %config.source.display(), "source file created");
            }
            if !report.header_changed && !report.source_changed {
                tracing::info!(function = %config.function, "nothing to insert");
            }
        }
        Commands::Annotate {
            header,
            funcs,
            regex,
            include_free,
            overwrite_comments,
            in_place,
            output,
            no_backup,
        } => {
            let destination = match (in_place, output) {
                (true, _) => annotate::Destination::InPlace { backup: !no_backup },
                (false, Some(path)) => annotate::Destination::File(path),
                (false, None) => annotate::Destination::Stdout,
            };
            let config = annotate::AnnotateConfig {
                header,
                targets: funcs.iter().map(|f| annotate::Target::parse(f)).collect(),
                use_regex: regex,
                include_free,
                overwrite_comments,
                destination,
            };
            annotate::run(&config)?;
        }
    }

    Ok(())
}
