// src/relay/pumps.rs

//! The three pump loops of a relay.
//!
//! Each pump is its own Tokio task and only touches its own stream, so a
//! stalled stream never blocks the others. An I/O fault stops the pump that
//! hit it and nothing else.

use std::fmt;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use super::decode::Utf8ChunkDecoder;
use super::events::RelayEvent;
use super::process_relay::{LINE_TERMINATOR, Shared};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    fn event(self, text: String) -> RelayEvent {
        match self {
            OutputStream::Stdout => RelayEvent::Stdout(text),
            OutputStream::Stderr => RelayEvent::Stderr(text),
        }
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => f.write_str("stdout"),
            OutputStream::Stderr => f.write_str("stderr"),
        }
    }
}

/// Drain one output stream, delivering decoded chunks in read order.
///
/// Stops at end-of-stream or on a read error. Every chunk that was read is
/// delivered; empty chunks never are. The exit watcher may abort a pump that
/// stays silent after the child is gone.
pub(crate) async fn pump_output<R>(
    stream: OutputStream,
    mut reader: R,
    shared: Arc<Shared>,
    chunk_size: usize,
) where
    R: AsyncRead + Unpin,
{
    debug!(%stream, chunk_size, "output pump started");

    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut decoder = Utf8ChunkDecoder::new();

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                let tail = decoder.finish();
                if !tail.is_empty() {
                    shared.events.emit(stream.event(tail));
                }
                break;
            }
            Ok(n) => {
                let text = decoder.decode(&buf[..n]);
                trace!(%stream, bytes = n, chars = text.chars().count(), "read chunk");
                if !text.is_empty() {
                    shared.events.emit(stream.event(text));
                }
                shared.note_output();
            }
            Err(e) => {
                warn!(%stream, error = %e, "read failed; stopping pump");
                break;
            }
        }

        tokio::task::yield_now().await;
    }

    debug!(%stream, "output pump finished");
}

/// Flush the mailbox to the child's stdin until the child exits.
///
/// The message is taken out of the mailbox before it is written, so a write
/// that lands during a flush is kept for the next round.
pub(crate) async fn pump_input<W>(mut writer: W, shared: Arc<Shared>)
where
    W: AsyncWrite + Unpin,
{
    debug!("input pump started");
    let mut child_exited = shared.subscribe_child_exited();

    loop {
        tokio::select! {
            biased;
            _ = wait_exited(&mut child_exited) => break,
            _ = shared.mailbox.notified() => {}
        }

        let Some(data) = shared.mailbox.take() else {
            continue;
        };
        let line = terminate_line(data);

        if let Err(e) = write_flush(&mut writer, &line).await {
            warn!(error = %e, "write to stdin failed; stopping pump");
            break;
        }
        trace!(bytes = line.len(), "flushed pending input");
    }

    debug!("input pump finished");
}

async fn wait_exited(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

async fn write_flush<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

/// Append [`LINE_TERMINATOR`] unless the text already ends a line.
fn terminate_line(mut data: String) -> String {
    if !data.ends_with('\n') {
        data.push_str(LINE_TERMINATOR);
    }
    data
}
