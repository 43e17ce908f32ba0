// src/session.rs

//! Interactive console session around a started [`ProcessRelay`].
//!
//! Child stdout goes to our stdout, child stderr to our stderr, and console
//! lines are forwarded with `write_line` while the relay is running.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::relay::ProcessRelay;

/// Print relayed output to the console as it arrives.
pub fn attach_console(relay: &ProcessRelay) {
    relay.on_stdout(|text: &str| {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    });
    relay.on_stderr(|text: &str| {
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(text.as_bytes());
        let _ = err.flush();
    });
}

/// Forward lines from `input` to the relay until the child exits, then print
/// the exit banner and return the exit code.
///
/// End of input stops forwarding; the session keeps waiting for the child.
pub async fn run_session<R>(relay: &ProcessRelay, input: R) -> Result<i32>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut input_open = true;

    loop {
        tokio::select! {
            code = relay.wait_for_exit() => {
                let code = code?;
                println!("\nProcess exited with code {code}");
                return Ok(code);
            }
            line = lines.next_line(), if input_open && relay.is_running() => {
                match line {
                    Ok(Some(line)) => relay.write_line(line.as_str()),
                    Ok(None) => {
                        debug!("console input closed; waiting for process exit");
                        input_open = false;
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read console input; no longer forwarding");
                        input_open = false;
                    }
                }
            }
        }
    }
}

/// [`run_session`] on the process's own stdin.
pub async fn run_console(relay: &ProcessRelay) -> Result<i32> {
    run_session(relay, BufReader::new(tokio::io::stdin())).await
}
