//! Quill CLI - markdown pipeline.
//!
//! Provides commands for:
//! - `render`: Render markdown to HTML with heading anchors and highlighting
//! - `toc`: Print the table of contents
//! - `parse`: Print the document tree as JSON
//! - `fmt`: Normalize markdown through the document tree

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use quill_markdown::MappingTable;
use tracing_subscriber::EnvFilter;

use commands::{FmtArgs, ParseArgs, RenderArgs, TocArgs};
use error::CliError;
use output::Output;

/// Quill - markdown document pipeline.
#[derive(Parser)]
#[command(name = "quill", version, about)]
struct Cli {
    /// Enable verbose output (info-level logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render markdown to HTML.
    Render(RenderArgs),
    /// Print the table of contents.
    Toc(TocArgs),
    /// Print the document tree as JSON.
    Parse(ParseArgs),
    /// Rewrite markdown in normalized form.
    Fmt(FmtArgs),
}

impl Commands {
    fn execute(self) -> Result<(), CliError> {
        MappingTable::standard().validate()?;

        match self {
            Self::Render(args) => args.execute(),
            Self::Toc(args) => args.execute(),
            Self::Parse(args) => args.execute(),
            Self::Fmt(args) => args.execute(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = cli.command.execute() {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
