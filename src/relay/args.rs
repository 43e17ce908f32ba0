// src/relay/args.rs

//! Argument string handling for the child process.
//!
//! Arguments are joined with single spaces into one string, and that string
//! is what the platform sees. There is no quoting: an argument that contains
//! whitespace ends up as several arguments in the child.

/// Join arguments with single spaces.
pub fn join_args(args: &[&str]) -> String {
    args.join(" ")
}

/// Split an argument string into argv entries the way the child will see it
/// on platforms without a raw command line (whitespace separated, no quotes).
pub fn split_argument_string(arguments: &str) -> Vec<&str> {
    arguments.split_whitespace().collect()
}
