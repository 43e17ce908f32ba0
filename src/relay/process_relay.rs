// src/relay/process_relay.rs

//! `ProcessRelay` lifecycle: construction, start, state and exit handling.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::RelaySection;
use crate::errors::{ExecppError, Result};

use super::args::join_args;
use super::events::{DeliveryContext, EventHub, RelayEvent};
use super::mailbox::Mailbox;
use super::pumps::{OutputStream, pump_input, pump_output};

/// Line terminator appended by `write_line` and by the stdin pump.
pub const LINE_TERMINATOR: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Tunables for a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    /// Maximum number of bytes read from stdout/stderr per chunk.
    pub chunk_size: usize,
    /// After the child has exited, how long the output pumps may stay silent
    /// before the exit notification fires without waiting for end-of-stream.
    /// Every delivered chunk restarts the wait.
    pub exit_drain: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::from(&RelaySection::default())
    }
}

impl From<&RelaySection> for RelayConfig {
    fn from(section: &RelaySection) -> Self {
        Self {
            chunk_size: section.chunk_size.max(1),
            exit_drain: Duration::from_millis(section.exit_drain_ms),
        }
    }
}

/// Lifecycle of a relay. `Exited` is terminal; a relay is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Created,
    Running,
    Exited,
}

/// State shared between the relay handle and its background tasks.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) events: EventHub,
    pub(crate) mailbox: Mailbox,
    state: Mutex<RelayState>,
    exit_code: OnceLock<i32>,
    /// Flipped once the OS reports the child has exited.
    child_exited: watch::Sender<bool>,
    /// Bumped by the output pumps after each delivered chunk.
    output_activity: watch::Sender<u64>,
    /// Set to the exit code after the exit notification has fired.
    finished: watch::Sender<Option<i32>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            events: EventHub::default(),
            mailbox: Mailbox::new(),
            state: Mutex::new(RelayState::Created),
            exit_code: OnceLock::new(),
            child_exited: watch::channel(false).0,
            output_activity: watch::channel(0).0,
            finished: watch::channel(None).0,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RelayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn subscribe_child_exited(&self) -> watch::Receiver<bool> {
        self.child_exited.subscribe()
    }

    pub(crate) fn note_output(&self) {
        self.output_activity.send_modify(|n| *n = n.wrapping_add(1));
    }

    /// Move to `Exited` and fire the exit notification. Runs at most once.
    fn finish(&self, code: i32) {
        {
            let mut state = self.lock_state();
            if *state == RelayState::Exited {
                return;
            }
            let _ = self.exit_code.set(code);
            *state = RelayState::Exited;
        }

        self.events.emit(RelayEvent::Exited(code));
        self.finished.send_replace(Some(code));
    }
}

/// Runs one executable as a child process and relays its standard streams.
///
/// ```no_run
/// # async fn demo() -> execpp::errors::Result<()> {
/// use execpp::relay::ProcessRelay;
///
/// let relay = ProcessRelay::new("/tmp/hello");
/// relay.on_stdout(|text: &str| print!("{text}"));
/// relay.on_exit(|code| println!("exited with {code}"));
/// relay.start(&[])?;
/// relay.write_line("world");
/// let code = relay.wait_for_exit().await?;
/// # let _ = code;
/// # Ok(())
/// # }
/// ```
///
/// `start` must be called from within a Tokio runtime.
#[derive(Debug)]
pub struct ProcessRelay {
    executable_path: PathBuf,
    config: RelayConfig,
    context: Option<DeliveryContext>,
    shared: Arc<Shared>,
}

impl ProcessRelay {
    /// Create an inert relay. Nothing is spawned until [`start`](Self::start).
    pub fn new(executable_path: impl Into<PathBuf>) -> Self {
        Self {
            executable_path: executable_path.into(),
            config: RelayConfig::default(),
            context: None,
            shared: Arc::new(Shared::new()),
        }
    }

    pub fn with_config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    /// Post notifications to `context` instead of running handlers on the
    /// pump tasks. The context is captured when the relay starts.
    pub fn with_delivery_context(mut self, context: DeliveryContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn executable_path(&self) -> &Path {
        &self.executable_path
    }

    pub fn state(&self) -> RelayState {
        *self.shared.lock_state()
    }

    /// True from a successful `start` until the exit notification fires.
    pub fn is_running(&self) -> bool {
        self.state() == RelayState::Running
    }

    /// The child's exit code; `None` until the relay has exited.
    pub fn exit_code(&self) -> Option<i32> {
        self.shared.exit_code.get().copied()
    }

    /// Spawn the child and launch the pumps, returning immediately.
    ///
    /// `args` are joined with single spaces (see [`super::args`]), so an
    /// argument containing whitespace reaches the child split apart.
    pub fn start(&self, args: &[&str]) -> Result<()> {
        let mut state = self.shared.lock_state();
        match *state {
            RelayState::Created => {}
            RelayState::Running => {
                return Err(ExecppError::InvalidState(
                    "process is still running; wait for it to complete".to_string(),
                ));
            }
            RelayState::Exited => {
                return Err(ExecppError::InvalidState(
                    "process has already exited; create a new relay to run it again".to_string(),
                ));
            }
        }

        let arguments = join_args(args);
        let mut child = build_command(&self.executable_path, &arguments)
            .spawn()
            .map_err(|source| ExecppError::LaunchFailure {
                path: self.executable_path.clone(),
                source,
            })?;

        info!(
            path = %self.executable_path.display(),
            pid = child.id(),
            arguments = %arguments,
            "child process started"
        );

        if let Some(context) = &self.context {
            self.shared.events.capture_context(context.clone());
        }
        *state = RelayState::Running;
        drop(state);

        let mut output_pumps = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            output_pumps.push(tokio::spawn(pump_output(
                OutputStream::Stdout,
                stdout,
                Arc::clone(&self.shared),
                self.config.chunk_size,
            )));
        }
        if let Some(stderr) = child.stderr.take() {
            output_pumps.push(tokio::spawn(pump_output(
                OutputStream::Stderr,
                stderr,
                Arc::clone(&self.shared),
                self.config.chunk_size,
            )));
        }
        if let Some(stdin) = child.stdin.take() {
            tokio::spawn(pump_input(stdin, Arc::clone(&self.shared)));
        }

        tokio::spawn(watch_exit(
            child,
            output_pumps,
            Arc::clone(&self.shared),
            self.config.exit_drain,
        ));

        Ok(())
    }

    /// Queue `data` for the child's stdin. `None` is ignored.
    ///
    /// Only one message is held at a time: a write that lands before the
    /// stdin pump has picked up the previous one replaces it. The pump adds
    /// a line terminator if `data` does not already end with one.
    pub fn write<'a>(&self, data: impl Into<Option<&'a str>>) {
        if let Some(data) = data.into() {
            self.shared.mailbox.put(data.to_string());
        }
    }

    /// Like [`write`](Self::write), with [`LINE_TERMINATOR`] appended.
    pub fn write_line<'a>(&self, data: impl Into<Option<&'a str>>) {
        if let Some(data) = data.into() {
            self.shared.mailbox.put(format!("{data}{LINE_TERMINATOR}"));
        }
    }

    /// Whether a written message is still waiting for the stdin pump.
    pub fn has_pending_input(&self) -> bool {
        !self.shared.mailbox.is_empty()
    }

    pub fn on_stdout<F>(&self, handler: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.shared.events.subscribe_stdout(Arc::new(handler));
    }

    pub fn on_stderr<F>(&self, handler: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.shared.events.subscribe_stderr(Arc::new(handler));
    }

    /// Register an exit handler. It receives the child's exit code.
    pub fn on_exit<F>(&self, handler: F)
    where
        F: Fn(i32) + Send + Sync + 'static,
    {
        self.shared.events.subscribe_exit(Arc::new(handler));
    }

    /// Wait until the exit notification has fired and return the exit code.
    ///
    /// Fails with `InvalidState` if the relay was never started.
    pub async fn wait_for_exit(&self) -> Result<i32> {
        if self.state() == RelayState::Created {
            return Err(ExecppError::InvalidState(
                "relay was never started".to_string(),
            ));
        }

        let mut finished = self.shared.finished.subscribe();
        loop {
            let current = *finished.borrow_and_update();
            if let Some(code) = current {
                return Ok(code);
            }
            if finished.changed().await.is_err() {
                return Err(ExecppError::InvalidState(
                    "relay dropped before the process exited".to_string(),
                ));
            }
        }
    }
}

/// Build the child command: all three streams piped, no console window.
fn build_command(path: &Path, arguments: &str) -> Command {
    let mut cmd = Command::new(path);

    #[cfg(windows)]
    {
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        if !arguments.is_empty() {
            cmd.raw_arg(arguments);
        }
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    #[cfg(not(windows))]
    {
        cmd.args(super::args::split_argument_string(arguments));
    }

    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

/// Wait for the OS exit signal, let the output pumps drain, then fire the
/// exit notification.
///
/// The pumps get until end-of-stream, unless both stay silent for `drain`
/// (a grandchild holding the pipes open). Silent pumps are aborted and
/// joined before the notification, so exit is always the last event.
async fn watch_exit(
    mut child: Child,
    output_pumps: Vec<JoinHandle<()>>,
    shared: Arc<Shared>,
    drain: Duration,
) {
    let code = match child.wait().await {
        Ok(status) => {
            let code = exit_code_of(status);
            info!(exit_code = code, success = status.success(), "child process exited");
            code
        }
        Err(e) => {
            warn!(error = %e, "failed to wait for child process");
            -1
        }
    };

    shared.child_exited.send_replace(true);

    drain_output(output_pumps, &shared, drain).await;

    shared.finish(code);
}

async fn drain_output(output_pumps: Vec<JoinHandle<()>>, shared: &Shared, drain: Duration) {
    let mut activity = shared.output_activity.subscribe();
    let mut pumps = output_pumps.into_iter();

    while let Some(mut pump) = pumps.next() {
        let silent = loop {
            tokio::select! {
                joined = &mut pump => {
                    if let Err(e) = joined {
                        warn!(error = %e, "output pump task failed");
                    }
                    break false;
                }
                Ok(()) = activity.changed() => {}
                _ = tokio::time::sleep(drain) => break true,
            }
        };

        if silent {
            debug!(
                ?drain,
                "output silent after child exit; firing exit notification anyway"
            );
            for pump in std::iter::once(pump).chain(pumps) {
                pump.abort();
                let _ = pump.await;
            }
            return;
        }
    }
}

/// The child's exit code. On Unix a signal death maps to `128 + signal`,
/// the value a shell reports.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_relay_is_inert() {
        let relay = ProcessRelay::new("/definitely/not/here");
        assert_eq!(relay.state(), RelayState::Created);
        assert!(!relay.is_running());
        assert_eq!(relay.exit_code(), None);
        assert_eq!(relay.executable_path(), Path::new("/definitely/not/here"));
    }

    #[test]
    fn absent_write_leaves_mailbox_empty() {
        let relay = ProcessRelay::new("unused");
        relay.write(None);
        relay.write_line(None);
        assert!(!relay.has_pending_input());

        relay.write("x");
        assert!(relay.has_pending_input());
    }

    #[test]
    fn write_line_appends_terminator() {
        let relay = ProcessRelay::new("unused");
        relay.write_line("hello");
        assert_eq!(
            relay.shared.mailbox.take(),
            Some(format!("hello{LINE_TERMINATOR}"))
        );
    }

    #[test]
    fn relay_config_from_section() {
        let section = RelaySection {
            chunk_size: 16,
            exit_drain_ms: 25,
        };
        let cfg = RelayConfig::from(&section);
        assert_eq!(cfg.chunk_size, 16);
        assert_eq!(cfg.exit_drain, Duration::from_millis(25));
    }

    #[cfg(unix)]
    #[test]
    fn signal_death_maps_to_shell_code() {
        use std::os::unix::process::ExitStatusExt;

        assert_eq!(exit_code_of(ExitStatus::from_raw(42 << 8)), 42);
        assert_eq!(exit_code_of(ExitStatus::from_raw(9)), 137);
        assert_eq!(exit_code_of(ExitStatus::from_raw(15)), 143);
    }

    #[tokio::test]
    async fn wait_before_start_is_invalid_state() {
        let relay = ProcessRelay::new("unused");
        assert!(matches!(
            relay.wait_for_exit().await,
            Err(ExecppError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn missing_executable_is_launch_failure() {
        let relay = ProcessRelay::new("/definitely/not/here/execpp-missing");
        match relay.start(&[]) {
            Err(ExecppError::LaunchFailure { path, .. }) => {
                assert_eq!(path, PathBuf::from("/definitely/not/here/execpp-missing"));
            }
            other => panic!("expected LaunchFailure, got {other:?}"),
        }
        assert_eq!(relay.state(), RelayState::Created);
    }
}
