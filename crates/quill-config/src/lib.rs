//! Configuration management for Quill.
//!
//! Parses `quill.toml` with serde and discovers it in the current directory
//! or any of its parents. Values given on the command line are applied on
//! top of the file via [`CliSettings`].
//!
//! ```toml
//! [markdown]
//! gfm = true
//!
//! [highlight]
//! enabled = true
//! skip_languages = ["text"]
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override GitHub Flavored Markdown extensions.
    pub gfm: Option<bool>,
    /// Override syntax highlighting.
    pub highlight: Option<bool>,
}

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "quill.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Markdown parsing configuration.
    pub markdown: MarkdownConfig,
    /// Syntax highlighting configuration.
    pub highlight: HighlightConfig,
    /// Path to the loaded config file, if any.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Markdown parsing configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Enable tables and strikethrough.
    pub gfm: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self { gfm: true }
    }
}

/// Syntax highlighting configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Highlight fenced code blocks in rendered HTML.
    pub enabled: bool,
    /// Fence languages left as plain escaped text.
    pub skip_languages: Vec<String>,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            skip_languages: vec!["text".to_owned()],
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a string field to contain no whitespace.
fn require_no_whitespace(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "{field} cannot contain whitespace: {value:?}"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `quill.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// CLI settings are applied after loading, so they take precedence over
    /// config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, or reading,
    /// parsing or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_config_from(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            tracing::debug!("No {CONFIG_FILENAME} found, using defaults");
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(gfm) = settings.gfm {
            self.markdown.gfm = gfm;
        }
        if let Some(highlight) = settings.highlight {
            self.highlight.enabled = highlight;
        }
    }

    /// Search for the config file in `start` and its parents.
    fn discover_config_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_highlight()
    }

    fn validate_highlight(&self) -> Result<(), ConfigError> {
        for language in &self.highlight.skip_languages {
            require_non_empty(language, "highlight.skip_languages entry")?;
            require_no_whitespace(language, "highlight.skip_languages entry")?;
        }
        Ok(())
    }
}
