//! `quill render` command implementation.

use clap::Args;
use quill_config::{CliSettings, Config};
use quill_highlight::Highlighter;

use super::source::{SourceArgs, pipeline};
use crate::error::CliError;
use crate::output::write_result;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Disable syntax highlighting of code blocks.
    #[arg(long)]
    no_highlight: bool,
}

impl RenderArgs {
    /// Execute the render command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let settings = CliSettings {
            highlight: self.no_highlight.then_some(false),
            ..CliSettings::default()
        };
        let config = self.source.load_config(settings)?;
        let markdown = self.source.read()?;

        write_result(&render(&markdown, &config))?;
        Ok(())
    }
}

/// Render markdown to HTML, highlighting code blocks when enabled.
fn render(markdown: &str, config: &Config) -> String {
    let html = pipeline(config).render_to_html(markdown);
    if !config.highlight.enabled {
        return html;
    }
    Highlighter::new()
        .with_skipped_languages(&config.highlight.skip_languages)
        .highlight(&html)
}
