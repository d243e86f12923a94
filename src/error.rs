use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("could not read config file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse config file '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid config in '{path}': {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("could not serialize config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // Raised after the plan has been reported; only the weight update is lost.
    #[error("could not persist config to '{path}': {source}")]
    Persistence {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("quote session error: {0}")]
    Http(#[from] reqwest::Error),
}
