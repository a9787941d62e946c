use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] tanklog_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Not signed in. Run `tanklog auth login` first.")]
    NotSignedIn,
    #[error("Receipt image not found: {0}")]
    ImageNotFound(String),
    #[error("Unsupported image type: {0}. Use jpeg, png, or webp.")]
    UnsupportedImageType(String),
}
