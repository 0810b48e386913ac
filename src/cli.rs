//! Minimal CLI: type graph → (schema | literal expression)
use std::path::{Path, PathBuf};

use anyhow::{Context as _, anyhow};
use clap::{Args, Parser, Subcommand};

use crate::graph::{GraphDocument, TypeGraph};
use crate::resolve::{DEFAULT_MAX_DEPTH, GenericMode, ResolveOptions, Resolver};
use crate::schema::TypeSchema;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// resolve a type from a JSON type-graph document and output its schema,
/// either as JSON or as a literal expression
#[derive(Parser, Debug)]
#[command(name = "type-schema", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// resolve and print the JSON-schema-ish view
    Schema(SchemaOut),
    /// resolve and print the schema as an embeddable literal expression
    Expr(ExprOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to the type-graph document inside each input (e.g. /graph)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more type-graph documents. May be literal paths or quoted glob
    /// patterns; later documents override earlier type ids
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// type reference to resolve (a type id of the graph)
    #[arg(long = "type", short = 't')]
    type_ref: String,

    /// generic instantiations: resolve the unapplied definition or the instantiation itself
    #[arg(long, value_enum, default_value_t = GenericMode::Target)]
    generics: GenericMode,

    /// nested resolutions before degrading to `any`
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct ExprOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// wrap the expression as `export const <NAME> = ...;`
    #[arg(long)]
    export: Option<String>,

    /// output source file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_graph(&self) -> anyhow::Result<TypeGraph> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut document = GraphDocument::default();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            let json_value = serde_json::from_str::<serde_json::Value>(&source)
                .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
            let json_value = match self.json_pointer.as_deref() {
                None => json_value,
                Some(pointer) => json_value.pointer(pointer).cloned().ok_or_else(|| {
                    anyhow!("JSON pointer {pointer} matched nothing in {source_path_str}")
                })?,
            };
            let loaded = GraphDocument::from_json_value(json_value)
                .with_context(|| format!("invalid type graph ({source_path_str})"))?;
            tracing::debug!(
                path = %source_path_str,
                types = loaded.types.len(),
                "loaded type graph"
            );
            document.merge(loaded);
        }
        Ok(TypeGraph::new(document)?)
    }

    fn options(&self) -> ResolveOptions {
        ResolveOptions { generics: self.generics, max_depth: self.max_depth }
    }

    fn resolve(&self) -> anyhow::Result<TypeSchema> {
        let graph = self.load_graph()?;
        let node = graph.type_node(&self.type_ref)?;
        Ok(Resolver::with_options(&graph, self.options()).resolve_type_node(&node))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let schema = target.input_settings.resolve()?;
                let schema_src = serde_json::to_string_pretty(&schema)?;
                write_output(target.out.as_deref(), &schema_src)
            }
            Command::Expr(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let schema = target.input_settings.resolve()?;
                let expr = crate::expr::encode_value_as_expression(&schema)?;
                let source = match target.export.as_deref() {
                    Some(name) => format!("export const {name} = {expr};"),
                    None => expr.to_string(),
                };
                write_output(target.out.as_deref(), &source)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&Path>, source: &str) -> anyhow::Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, source)
                .with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{source}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                return Err(anyhow!("glob pattern matched no files: {pattern}"));
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
