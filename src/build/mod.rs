// src/build/mod.rs

//! Compile step that produces the executable handed to the relay.
//!
//! - [`paths`] derives the temporary executable path from the source file.
//! - [`compiler`] runs the configured compiler as one awaited subprocess.

pub mod compiler;
pub mod paths;

pub use compiler::{compile, compile_command_line};
pub use paths::{temp_executable_path, temp_executable_path_in};
