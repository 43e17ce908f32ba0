// src/build/compiler.rs

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{error, info};

use crate::config::CompilerSection;
use crate::errors::{ExecppError, Result};

/// Compile `source` into `output` with the configured compiler.
///
/// Runs `<program> <args..> -o <output> <source>` and waits for it. The
/// compiler shares the terminal, so its diagnostics are shown directly.
pub async fn compile(compiler: &CompilerSection, source: &Path, output: &Path) -> Result<()> {
    info!(
        command = %compile_command_line(compiler, source, output),
        "compiling source file"
    );

    let status = build_command(compiler, source, output)
        .status()
        .await
        .map_err(|source| ExecppError::LaunchFailure {
            path: PathBuf::from(&compiler.program),
            source,
        })?;

    if !status.success() {
        let code = status.code().unwrap_or(-1);
        error!(source = %source.display(), exit_code = code, "compiler reported failure");
        return Err(ExecppError::CompileFailed {
            source_file: source.to_path_buf(),
            code,
        });
    }

    info!(output = %output.display(), "compilation finished");
    Ok(())
}

/// Human-readable form of the compile command (used by `--dry-run` and logs).
pub fn compile_command_line(compiler: &CompilerSection, source: &Path, output: &Path) -> String {
    let mut parts = vec![compiler.program.clone()];
    parts.extend(compiler.args.iter().cloned());
    parts.push("-o".to_string());
    parts.push(output.display().to_string());
    parts.push(source.display().to_string());
    parts.join(" ")
}

fn build_command(compiler: &CompilerSection, source: &Path, output: &Path) -> Command {
    let mut cmd = Command::new(&compiler.program);
    cmd.args(&compiler.args)
        .arg("-o")
        .arg(output)
        .arg(source)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_orders_flags_before_output() {
        let compiler = CompilerSection {
            program: "clang++".to_string(),
            args: vec!["-O2".to_string(), "-std=c++20".to_string()],
        };
        let line = compile_command_line(&compiler, Path::new("a.cpp"), Path::new("/tmp/a"));
        assert_eq!(line, "clang++ -O2 -std=c++20 -o /tmp/a a.cpp");
    }

    #[tokio::test]
    async fn missing_compiler_is_launch_failure() {
        let compiler = CompilerSection {
            program: "/definitely/not/a/compiler".to_string(),
            args: vec![],
        };
        let err = compile(&compiler, Path::new("a.cpp"), Path::new("/tmp/a"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecppError::LaunchFailure { .. }));
    }
}
