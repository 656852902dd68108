//! Markdown input and configuration shared by all commands.

use std::io;
use std::path::{Path, PathBuf};

use clap::Args;
use quill_config::{CliSettings, Config};
use quill_markdown::MarkdownPipeline;

use crate::error::CliError;

/// Path that reads markdown from stdin.
const STDIN: &str = "-";

/// Input arguments common to every command.
#[derive(Args)]
pub(crate) struct SourceArgs {
    /// Markdown file to read (`-` for stdin).
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Path to configuration file (default: auto-discover quill.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable GitHub Flavored Markdown (tables, strikethrough).
    #[arg(long)]
    no_gfm: bool,
}

impl SourceArgs {
    /// Read the markdown input.
    pub(crate) fn read(&self) -> Result<String, CliError> {
        if self.is_stdin() {
            return Ok(io::read_to_string(io::stdin())?);
        }
        std::fs::read_to_string(&self.input).map_err(|err| {
            CliError::Io(io::Error::new(
                err.kind(),
                format!("{}: {err}", self.input.display()),
            ))
        })
    }

    /// Name of the input for messages.
    pub(crate) fn display_name(&self) -> String {
        if self.is_stdin() {
            "<stdin>".to_owned()
        } else {
            self.input.display().to_string()
        }
    }

    /// Load configuration with this command's overrides applied.
    pub(crate) fn load_config(&self, mut settings: CliSettings) -> Result<Config, CliError> {
        if self.no_gfm {
            settings.gfm = Some(false);
        }
        let config = Config::load(self.config.as_deref(), Some(&settings))?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Using configuration");
        }
        Ok(config)
    }

    fn is_stdin(&self) -> bool {
        self.input == Path::new(STDIN)
    }
}

/// Pipeline configured from `config`.
pub(crate) fn pipeline(config: &Config) -> MarkdownPipeline<'static> {
    MarkdownPipeline::new().with_gfm(config.markdown.gfm)
}
