// src/errors.rs

//! Crate-wide error type and `Result` alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecppError {
    /// The child process could not be created (missing file, permissions, ...).
    #[error("could not launch '{}': {source}", .path.display())]
    LaunchFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `start` was called on a relay that is running or has already exited.
    #[error("invalid relay state: {0}")]
    InvalidState(String),

    #[error("Fatal Error: No Input Files")]
    NoInputFiles,

    #[error("Fatal Error: Bad Input")]
    BadInput,

    #[error("File Path Fault: {0}")]
    FilePath(String),

    #[error("compiling '{}' failed with exit code {code}", .source_file.display())]
    CompileFailed { source_file: PathBuf, code: i32 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ExecppError>;
