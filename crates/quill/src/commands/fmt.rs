//! `quill fmt` command implementation.

use clap::Args;
use quill_config::{CliSettings, Config};

use super::source::{SourceArgs, pipeline};
use crate::error::CliError;
use crate::output::{Output, write_result};

/// Arguments for the fmt command.
#[derive(Args)]
pub(crate) struct FmtArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Exit with an error if the input is not already normalized.
    #[arg(long)]
    check: bool,
}

impl FmtArgs {
    /// Execute the fmt command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let config = self.source.load_config(CliSettings::default())?;
        let markdown = self.source.read()?;
        let formatted = format_markdown(&markdown, &config);

        if !self.check {
            write_result(&formatted)?;
            return Ok(());
        }

        let name = self.source.display_name();
        if formatted != markdown {
            tracing::info!(input = %name, "Input differs from normalized form");
            return Err(CliError::Check(name));
        }
        Output::new().success(&format!("{name} is formatted"));
        Ok(())
    }
}

/// Normalize markdown by parsing it and writing the tree back.
fn format_markdown(markdown: &str, config: &Config) -> String {
    let pipeline = pipeline(config);
    pipeline.serialize_to_markdown(&pipeline.parse_to_document(markdown))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_normalizes() {
        let config = Config::default();
        assert_eq!(format_markdown("* x\n* y", &config), "- x\n- y\n");
        assert_eq!(format_markdown("Title\n=====", &config), "# Title\n");
    }

    #[test]
    fn test_format_is_stable() {
        let config = Config::default();
        let once = format_markdown("# A\n\n> *quoted*\n\n1. one\n2. two", &config);
        assert_eq!(format_markdown(&once, &config), once);
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_markdown("", &Config::default()), "");
    }
}
