// src/relay/events.rs

//! Notification delivery for a [`ProcessRelay`](super::ProcessRelay).
//!
//! Three typed streams exist: stdout text, stderr text and process exit.
//! Handlers can be registered at any time; an event is only seen by the
//! handlers registered when it fires (no buffering, no replay).
//!
//! By default handlers run inline on the pump task that produced the event.
//! If a [`DeliveryContext`] is attached, events are posted to it instead and
//! run wherever the caller drives the matching [`DeliveryLoop`].

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tokio::sync::mpsc;
use tracing::trace;

pub(crate) type TextHandler = Arc<dyn Fn(&str) + Send + Sync>;
pub(crate) type ExitHandler = Arc<dyn Fn(i32) + Send + Sync>;

type Job = Box<dyn FnOnce() + Send>;

/// A single notification, as produced by the pumps and the exit watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    Stdout(String),
    Stderr(String),
    Exited(i32),
}

/// Handle used by the relay to post notifications to the caller's task.
#[derive(Clone)]
pub struct DeliveryContext {
    tx: mpsc::UnboundedSender<Job>,
}

impl fmt::Debug for DeliveryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryContext")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl DeliveryContext {
    /// Create a context and the loop that executes what is posted to it.
    pub fn channel() -> (Self, DeliveryLoop) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, DeliveryLoop { rx })
    }

    /// Post a job. If the loop is gone the job is handed back.
    fn post(&self, job: Job) -> Result<(), Job> {
        self.tx.send(job).map_err(|err| err.0)
    }
}

/// Receiving side of a [`DeliveryContext`].
pub struct DeliveryLoop {
    rx: mpsc::UnboundedReceiver<Job>,
}

impl fmt::Debug for DeliveryLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryLoop")
            .field("queued", &self.rx.len())
            .finish()
    }
}

impl DeliveryLoop {
    /// Run posted notifications until every `DeliveryContext` clone is dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.rx.recv().await {
            job();
        }
    }

    /// Run whatever is queued right now without waiting. Returns the count.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }
}

/// Subscriber lists plus the (optional) captured delivery context.
#[derive(Default)]
pub(crate) struct EventHub {
    stdout: Mutex<Vec<TextHandler>>,
    stderr: Mutex<Vec<TextHandler>>,
    exit: Mutex<Vec<ExitHandler>>,
    context: OnceLock<DeliveryContext>,
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("stdout_handlers", &lock(&self.stdout).len())
            .field("stderr_handlers", &lock(&self.stderr).len())
            .field("exit_handlers", &lock(&self.exit).len())
            .field("context", &self.context.get())
            .finish()
    }
}

impl EventHub {
    pub(crate) fn subscribe_stdout(&self, handler: TextHandler) {
        lock(&self.stdout).push(handler);
    }

    pub(crate) fn subscribe_stderr(&self, handler: TextHandler) {
        lock(&self.stderr).push(handler);
    }

    pub(crate) fn subscribe_exit(&self, handler: ExitHandler) {
        lock(&self.exit).push(handler);
    }

    /// Capture the delivery context. Only the first call has an effect.
    pub(crate) fn capture_context(&self, context: DeliveryContext) {
        let _ = self.context.set(context);
    }

    /// Deliver an event to the handlers registered right now.
    pub(crate) fn emit(&self, event: RelayEvent) {
        let job = self.bind(event);

        match self.context.get() {
            Some(context) => {
                if let Err(job) = context.post(job) {
                    trace!("delivery loop dropped; delivering inline");
                    job();
                }
            }
            None => job(),
        }
    }

    /// Snapshot the relevant handlers so no lock is held while they run.
    fn bind(&self, event: RelayEvent) -> Job {
        match event {
            RelayEvent::Stdout(text) => {
                let handlers = lock(&self.stdout).clone();
                Box::new(move || handlers.iter().for_each(|h| h(&text)))
            }
            RelayEvent::Stderr(text) => {
                let handlers = lock(&self.stderr).clone();
                Box::new(move || handlers.iter().for_each(|h| h(&text)))
            }
            RelayEvent::Exited(code) => {
                let handlers = lock(&self.exit).clone();
                Box::new(move || handlers.iter().for_each(|h| h(code)))
            }
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
