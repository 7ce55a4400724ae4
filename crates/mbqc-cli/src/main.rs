//! MBQC graph-state compiler CLI.
//!
//! Provides the `mbqc` binary with subcommands that operate on a JSON graph
//! document (see `mbqc_core::document`):
//!
//! - `compile` -- compile the document's graph and flow to a pattern
//! - `lc` -- apply local complementation and write the updated document
//! - `pivot` -- apply a pivot and write the updated document (flow dropped)
//!
//! Log verbosity is read from the `MBQC_LOG` environment variable
//! (default: "warn"). Logs go to stderr so stdout stays machine-readable.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};

use mbqc_core::{local_complement, pivot, CoreError, GraphDocument, NodeId};
use mbqc_pattern::PatternError;

/// MBQC graph-state compiler and rewriting tools.
#[derive(Parser)]
#[command(name = "mbqc", about = "MBQC graph-state compiler and rewriting tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Pattern output format.
#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Text,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Compile a graph document to a measurement pattern.
    Compile {
        /// Path to the graph document (JSON).
        #[arg(short, long)]
        input: PathBuf,

        /// Output format.
        #[arg(short, long, value_enum, default_value = "json")]
        format: Format,

        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apply local complementation at a node.
    Lc {
        #[arg(short, long)]
        input: PathBuf,

        /// Target node.
        #[arg(short, long)]
        node: u32,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apply a pivot on two nodes.
    Pivot {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short)]
        u: u32,

        #[arg(short)]
        v: u32,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Failure of a subcommand, carrying its exit code.
enum CliError {
    /// Exit code 1.
    Rewrite(String),
    /// Exit code 3.
    Io(String),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Rewrite(_) => 1,
            CliError::Io(_) => 3,
        }
    }

    fn message(&self) -> &str {
        match self {
            CliError::Rewrite(msg) | CliError::Io(msg) => msg,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(e: CoreError) -> Self {
        CliError::Rewrite(e.to_string())
    }
}

impl From<PatternError> for CliError {
    fn from(e: PatternError) -> Self {
        CliError::Rewrite(e.to_string())
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compile {
            input,
            format,
            output,
        } => run_compile(&input, format, output.as_deref()),
        Commands::Lc {
            input,
            node,
            output,
        } => run_lc(&input, node.into(), output.as_deref()),
        Commands::Pivot {
            input,
            u,
            v,
            output,
        } => run_pivot(&input, u.into(), v.into(), output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e.message());
        process::exit(e.exit_code());
    }
}

/// Install the stderr subscriber at the level named by `MBQC_LOG`.
fn init_logging() {
    let level = std::env::var("MBQC_LOG")
        .ok()
        .and_then(|s| tracing::Level::from_str(&s).ok())
        .unwrap_or(tracing::Level::WARN);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &Path) -> Result<GraphDocument, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("failed to read '{}': {}", path.display(), e)))?;
    GraphDocument::from_json(&text)
        .map_err(|e| CliError::Io(format!("failed to parse '{}': {}", path.display(), e)))
}

fn emit(text: &str, output: Option<&Path>) -> Result<(), CliError> {
    match output {
        Some(path) => fs::write(path, text)
            .map_err(|e| CliError::Io(format!("failed to write '{}': {}", path.display(), e))),
        None => {
            println!("{}", text.trim_end());
            Ok(())
        }
    }
}

fn emit_document(doc: &GraphDocument, output: Option<&Path>) -> Result<(), CliError> {
    let json = doc
        .to_json()
        .map_err(|e| CliError::Io(format!("failed to serialize document: {}", e)))?;
    emit(&json, output)
}

/// Execute the compile subcommand.
fn run_compile(input: &Path, format: Format, output: Option<&Path>) -> Result<(), CliError> {
    let (graph, flow) = load(input)?.into_parts()?;
    let flow = flow.ok_or_else(|| {
        CliError::Rewrite(format!("'{}' has no flow to compile with", input.display()))
    })?;

    let pattern = mbqc_pattern::compile(&graph, &flow)?;
    tracing::info!(commands = pattern.len(), "compiled {}", input.display());

    let text = match format {
        Format::Json => serde_json::to_string_pretty(&pattern)
            .map_err(|e| CliError::Io(format!("failed to serialize pattern: {}", e)))?,
        Format::Text => pattern.to_string(),
    };
    emit(&text, output)
}

/// Execute the lc subcommand.
fn run_lc(input: &Path, node: NodeId, output: Option<&Path>) -> Result<(), CliError> {
    let (mut graph, mut flow) = load(input)?.into_parts()?;
    local_complement(&mut graph, flow.as_mut(), node)?;
    emit_document(&GraphDocument::from_parts(&graph, flow.as_ref()), output)
}

/// Execute the pivot subcommand.
fn run_pivot(input: &Path, u: NodeId, v: NodeId, output: Option<&Path>) -> Result<(), CliError> {
    let (mut graph, flow) = load(input)?.into_parts()?;
    pivot(&mut graph, None, u, v)?;
    if flow.is_some() {
        tracing::warn!("pivot invalidates the flow; it is omitted from the output");
    }
    emit_document(&GraphDocument::from_parts(&graph, None), output)
}
