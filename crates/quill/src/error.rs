//! CLI error types.

use quill_config::ConfigError;
use quill_markdown::MappingError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Mapping(#[from] MappingError),

    #[error("{0} is not formatted")]
    Check(String),
}
