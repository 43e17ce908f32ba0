// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod relay;
pub mod session;

use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::build::{compile, compile_command_line, temp_executable_path};
use crate::cli::CliArgs;
use crate::config::{ConfigFile, resolve_config};
use crate::errors::{ExecppError, Result};
use crate::relay::{ProcessRelay, RelayConfig};

/// High-level entry point used by `main.rs`. Returns the host exit code.
///
/// This wires together:
/// - input validation
/// - config loading
/// - compilation into the temp directory
/// - the process relay and the interactive console session
pub async fn run(args: CliArgs) -> Result<i32> {
    let source = match args.source_file() {
        Ok(source) => PathBuf::from(source),
        Err(e) => {
            println!("{e}");
            return Ok(0);
        }
    };

    let mut cfg = resolve_config(args.config.as_deref().map(Path::new))?;
    if let Some(program) = &args.compiler {
        cfg.compiler.program = program.clone();
    }

    let executable = match temp_executable_path(&source) {
        Ok(path) => path,
        Err(e) => {
            println!("{e}");
            return Ok(0);
        }
    };

    if args.dry_run {
        print_dry_run(&cfg, &source, &executable);
        return Ok(0);
    }

    compile(&cfg.compiler, &source, &executable).await?;

    let relay = ProcessRelay::new(&executable).with_config(RelayConfig::from(&cfg.relay));
    session::attach_console(&relay);

    match relay.start(&[]) {
        Ok(()) => info!(path = %executable.display(), "relay started"),
        Err(e @ ExecppError::LaunchFailure { .. }) => {
            error!(error = %e, "failed to launch compiled program");
            println!("Fatal Error: {e}");
            return Ok(1);
        }
        Err(e) => return Err(e),
    }

    session::run_console(&relay).await
}

/// Simple dry-run output: print the resolved config and commands.
fn print_dry_run(cfg: &ConfigFile, source: &Path, executable: &Path) {
    println!("execpp dry-run");
    println!("  source     = {}", source.display());
    println!("  executable = {}", executable.display());
    println!("  compile    = {}", compile_command_line(&cfg.compiler, source, executable));
    println!("  relay.chunk_size    = {}", cfg.relay.chunk_size);
    println!("  relay.exit_drain_ms = {}", cfg.relay.exit_drain_ms);

    debug!("dry-run complete (no execution)");
}
