use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// The shell used to run test scripts.
///
/// Scripts are passed to the shell as an argument instead of being executed
/// directly, which avoids `ETXTBSY` when another test thread forks while a
/// freshly written script is still open.
pub fn shell() -> PathBuf {
    PathBuf::from("/bin/sh")
}

/// Scratch directory holding small shell scripts for relay tests.
pub struct ScriptDir {
    dir: TempDir,
}

impl ScriptDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `body` as `<name>` and return its path as a string suitable for
    /// `ProcessRelay::start`.
    pub fn script(&self, name: &str, body: &str) -> String {
        let path = self.dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("failed to write script");
        path.to_str().expect("temp path is not UTF-8").to_string()
    }

    /// Write a file with the given mode bits.
    pub fn file_with_mode(&self, name: &str, contents: &str, mode: u32) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("failed to write file");
        fs::set_permissions(&path, fs::Permissions::from_mode(mode))
            .expect("failed to set permissions");
        path
    }
}

impl Default for ScriptDir {
    fn default() -> Self {
        Self::new()
    }
}
