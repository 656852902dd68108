//! `quill toc` command implementation.

use std::fmt::Write;

use clap::Args;
use quill_config::CliSettings;
use quill_markdown::TocEntry;

use super::source::{SourceArgs, pipeline};
use crate::error::CliError;
use crate::output::write_result;

/// Arguments for the toc command.
#[derive(Args)]
pub(crate) struct TocArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Print the entries as a JSON array.
    #[arg(long)]
    json: bool,
}

impl TocArgs {
    /// Execute the toc command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let config = self.source.load_config(CliSettings::default())?;
        let markdown = self.source.read()?;
        let toc = pipeline(&config).extract_toc(&markdown);

        let text = if self.json {
            serde_json::to_string_pretty(&toc)?
        } else {
            format_outline(&toc)
        };
        write_result(&text)?;
        Ok(())
    }
}

/// Indented outline, one `- text (#id)` line per entry.
///
/// Indentation is relative to the shallowest heading in the document.
fn format_outline(toc: &[TocEntry]) -> String {
    let base = toc.iter().map(|entry| entry.level).min().unwrap_or(1);
    let mut out = String::new();
    for entry in toc {
        let indent = "  ".repeat(usize::from(entry.level - base));
        let _ = writeln!(out, "{indent}- {} (#{})", entry.text, entry.id);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quill_markdown::extract_toc;

    #[test]
    fn test_format_outline() {
        let toc = extract_toc("# Guide\n\n## Install\n\n### Linux\n\n## Install");
        assert_eq!(
            format_outline(&toc),
            "- Guide (#guide)\n  - Install (#install)\n    - Linux (#linux)\n  - Install (#install-1)\n"
        );
    }

    #[test]
    fn test_format_outline_relative_to_shallowest() {
        let toc = extract_toc("## A\n\n### B");
        assert_eq!(format_outline(&toc), "- A (#a)\n  - B (#b)\n");
    }

    #[test]
    fn test_format_outline_empty() {
        assert_eq!(format_outline(&[]), "");
    }

    #[test]
    fn test_json_output() {
        let json = serde_json::to_string(&extract_toc("# Hello")).unwrap();
        assert_eq!(json, r#"[{"id":"hello","text":"Hello","level":1}]"#);
    }
}
