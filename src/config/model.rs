// src/config/model.rs

use serde::Deserialize;

/// Configuration exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [compiler]
/// program = "g++"
/// args = ["-O2", "-std=c++20"]
///
/// [relay]
/// chunk_size = 1024
/// exit_drain_ms = 500
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub compiler: CompilerSection,

    #[serde(default)]
    pub relay: RelaySection,
}

/// Validated configuration. Only constructible through `TryFrom<RawConfigFile>`
/// (see `validate.rs`) or [`ConfigFile::default`].
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub compiler: CompilerSection,
    pub relay: RelaySection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(compiler: CompilerSection, relay: RelaySection) -> Self {
        Self { compiler, relay }
    }
}

/// `[compiler]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerSection {
    /// Compiler executable, looked up on `PATH`.
    #[serde(default = "default_program")]
    pub program: String,

    /// Extra flags placed before `-o <output> <source>`.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_program() -> String {
    "g++".to_string()
}

impl Default for CompilerSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
        }
    }
}

/// `[relay]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelaySection {
    /// Maximum number of bytes read from stdout/stderr per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// How long to wait for the output pumps to drain after the child exits
    /// before the exit notification is fired anyway.
    #[serde(default = "default_exit_drain_ms")]
    pub exit_drain_ms: u64,
}

fn default_chunk_size() -> usize {
    1024
}

fn default_exit_drain_ms() -> u64 {
    500
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            exit_drain_ms: default_exit_drain_ms(),
        }
    }
}
