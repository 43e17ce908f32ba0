// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::errors::{ExecppError, Result};

/// Command-line arguments for `execpp`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "execpp",
    version,
    about = "Compile a source file and run it interactively.",
    long_about = None
)]
pub struct CliArgs {
    /// Source file to compile and run.
    ///
    /// Exactly one is accepted; the count is checked by [`CliArgs::source_file`]
    /// rather than by clap so the error messages stay stable.
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Execpp.toml` in the current working directory. A missing
    /// default file is fine; a missing explicit one is an error.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Compiler executable, overriding `compiler.program` from the config.
    #[arg(long, value_name = "PROGRAM")]
    pub compiler: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `EXECPP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the compile command and executable path, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// The single input file, or the fatal error matching how many were given.
    pub fn source_file(&self) -> Result<&str> {
        match self.inputs.as_slice() {
            [] => Err(ExecppError::NoInputFiles),
            [single] => Ok(single.as_str()),
            _ => Err(ExecppError::BadInput),
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
