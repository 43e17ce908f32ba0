// src/relay/mod.rs

//! Interactive subprocess I/O relay.
//!
//! A [`ProcessRelay`] owns one child process and three Tokio tasks ("pumps"):
//!
//! - stdout pump: reads decoded chunks and fires `on_stdout` handlers.
//! - stderr pump: same, for `on_stderr`.
//! - stdin pump: flushes the single-slot [`Mailbox`] to the child's stdin.
//!
//! A fourth task waits on the child's exit status, lets the output pumps
//! drain and then fires `on_exit` exactly once.
//!
//! - [`process_relay`] holds the lifecycle / state machine.
//! - [`pumps`] contains the three pump loops.
//! - [`events`] implements subscriptions and the optional [`DeliveryContext`].
//! - [`mailbox`] is the last-write-wins stdin slot.
//! - [`decode`] turns raw byte chunks into UTF-8 text.
//! - [`args`] builds the child's argument string.

pub mod args;
pub mod decode;
pub mod events;
pub mod mailbox;
pub mod process_relay;
mod pumps;

pub use args::join_args;
pub use decode::Utf8ChunkDecoder;
pub use events::{DeliveryContext, DeliveryLoop, RelayEvent};
pub use mailbox::Mailbox;
pub use process_relay::{LINE_TERMINATOR, ProcessRelay, RelayConfig, RelayState};
