// src/config/mod.rs

//! Configuration loading and validation for execpp.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like a non-empty compiler name (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, resolve_config};
pub use model::{CompilerSection, ConfigFile, RawConfigFile, RelaySection};
