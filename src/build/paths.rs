// src/build/paths.rs

use std::path::{Path, PathBuf};

use crate::errors::{ExecppError, Result};

/// `<system temp dir>/<source file name without extension>`.
pub fn temp_executable_path(source: impl AsRef<Path>) -> Result<PathBuf> {
    temp_executable_path_in(std::env::temp_dir(), source)
}

/// Same as [`temp_executable_path`] with an explicit output directory.
pub fn temp_executable_path_in(dir: impl AsRef<Path>, source: impl AsRef<Path>) -> Result<PathBuf> {
    let source = source.as_ref();
    let stem = source
        .file_stem()
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            ExecppError::FilePath(format!("'{}' does not name a file", source.display()))
        })?;

    Ok(dir.as_ref().join(stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_directory_and_extension() {
        let path = temp_executable_path_in("/tmp/out", "src/nested/solve.cpp").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/out/solve"));
    }

    #[test]
    fn only_last_extension_is_removed() {
        let path = temp_executable_path_in("/tmp", "archive.test.cc").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/archive.test"));
    }

    #[test]
    fn file_without_extension_keeps_its_name() {
        let path = temp_executable_path_in("/tmp", "main").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/main"));
    }

    #[test]
    fn paths_without_a_file_name_are_rejected() {
        for bad in ["", "/", ".."] {
            match temp_executable_path_in("/tmp", bad) {
                Err(ExecppError::FilePath(msg)) => assert!(msg.contains("does not name a file")),
                other => panic!("expected FilePath for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn default_uses_system_temp_dir() {
        let path = temp_executable_path("prog.cpp").unwrap();
        assert_eq!(path, std::env::temp_dir().join("prog"));
    }
}
