//! Error types for Launchpad

use std::path::PathBuf;

use crate::types::BuildStage;

/// Launchpad error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Deployment not found: {0}")]
    NotFound(String),

    #[error("App not found: {0}")]
    AppNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Build failed during {stage}: {stderr}")]
    BuildFailed { stage: BuildStage, stderr: String },

    #[error("Build process timed out during {stage} after {secs}s")]
    BuildTimeout { stage: BuildStage, secs: u64 },

    #[error("Build directory not found (looked for {0:?})")]
    OutputNotFound(Vec<String>),

    #[error("Subdomain already taken: {0}")]
    SubdomainTaken(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Corrupt record {}: {reason}", path.display())]
    CorruptRecord { path: PathBuf, reason: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Database error: {0}")]
    Db(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Coarse classification used by the transport layer to choose a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Internal,
}

/// Result type alias for Launchpad
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Error::Validation(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn db<S: Into<String>>(msg: S) -> Self {
        Error::Db(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) | Error::AppNotFound(_) | Error::FileNotFound(_) => {
                ErrorKind::NotFound
            }
            Error::Validation(_) => ErrorKind::Validation,
            _ => ErrorKind::Internal,
        }
    }
}
