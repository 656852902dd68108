//! `quill parse` command implementation.

use clap::Args;
use quill_config::CliSettings;

use super::source::{SourceArgs, pipeline};
use crate::error::CliError;
use crate::output::write_result;

/// Arguments for the parse command.
#[derive(Args)]
pub(crate) struct ParseArgs {
    #[command(flatten)]
    source: SourceArgs,
}

impl ParseArgs {
    /// Execute the parse command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let config = self.source.load_config(CliSettings::default())?;
        let markdown = self.source.read()?;
        let doc = pipeline(&config).parse_to_document(&markdown);

        write_result(&serde_json::to_string_pretty(&doc)?)?;
        Ok(())
    }
}
