// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{ExecppError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::ExecppError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.compiler, raw.relay))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_compiler(cfg)?;
    validate_relay(cfg)?;
    Ok(())
}

fn validate_compiler(cfg: &RawConfigFile) -> Result<()> {
    if cfg.compiler.program.trim().is_empty() {
        return Err(ExecppError::ConfigError(
            "[compiler].program must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_relay(cfg: &RawConfigFile) -> Result<()> {
    if cfg.relay.chunk_size == 0 {
        return Err(ExecppError::ConfigError(
            "[relay].chunk_size must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
