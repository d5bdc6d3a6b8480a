use std::path::PathBuf;

use marketsync_core::{ConfigError, CoreError, ValidationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sync(#[from] CoreError),

    #[error("cannot read '{path}': {source}")]
    Input {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("'{path}' is not valid JSON for {expected}: {source}")]
    Decode {
        path: PathBuf,
        expected: &'static str,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Config(_) | Self::Decode { .. } => 2,
            Self::Sync(_) => 3,
            Self::Serialization(_) => 4,
            Self::Input { .. } | Self::Io(_) => 10,
        }
    }
}
