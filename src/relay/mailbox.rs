// src/relay/mailbox.rs

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

/// Single-slot outbound buffer for the child's stdin.
///
/// Holds at most one message. A `put` before the stdin pump has taken the
/// previous value overwrites it (last write wins). The lock is never held
/// across an `.await`.
#[derive(Debug, Default)]
pub struct Mailbox {
    slot: Mutex<Option<String>>,
    notify: Notify,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending message and wake the stdin pump.
    pub fn put(&self, data: String) {
        *self.lock() = Some(data);
        self.notify.notify_one();
    }

    /// Take the pending message, leaving the slot empty.
    pub fn take(&self) -> Option<String> {
        self.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    /// Resolves after a `put`. A `put` with no waiter leaves a permit, so a
    /// wake-up is never lost.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
