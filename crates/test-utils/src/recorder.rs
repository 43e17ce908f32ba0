use std::sync::{Arc, Mutex};
use std::time::Duration;

use execpp::relay::{ProcessRelay, RelayEvent};

/// Records every notification a relay delivers, in delivery order.
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<RelayEvent>>>,
}

impl EventRecorder {
    /// Create a recorder subscribed to all three streams of `relay`.
    pub fn attach(relay: &ProcessRelay) -> Self {
        let recorder = Self::default();

        let events = Arc::clone(&recorder.events);
        relay.on_stdout(move |text: &str| {
            events.lock().unwrap().push(RelayEvent::Stdout(text.to_string()))
        });
        let events = Arc::clone(&recorder.events);
        relay.on_stderr(move |text: &str| {
            events.lock().unwrap().push(RelayEvent::Stderr(text.to_string()))
        });
        let events = Arc::clone(&recorder.events);
        relay.on_exit(move |code| events.lock().unwrap().push(RelayEvent::Exited(code)));

        recorder
    }

    pub fn events(&self) -> Vec<RelayEvent> {
        self.events.lock().unwrap().clone()
    }

    /// All stdout chunks concatenated.
    pub fn stdout(&self) -> String {
        self.collect(|e| match e {
            RelayEvent::Stdout(t) => Some(t.as_str()),
            _ => None,
        })
    }

    /// All stderr chunks concatenated.
    pub fn stderr(&self) -> String {
        self.collect(|e| match e {
            RelayEvent::Stderr(t) => Some(t.as_str()),
            _ => None,
        })
    }

    pub fn stdout_chunks(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RelayEvent::Stdout(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn exit_codes(&self) -> Vec<i32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RelayEvent::Exited(code) => Some(code),
                _ => None,
            })
            .collect()
    }

    /// Poll until stdout contains `needle` (panics after 5 seconds).
    pub async fn wait_for_stdout(&self, needle: &str) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !self.stdout().contains(needle) {
            if tokio::time::Instant::now() >= deadline {
                panic!("timed out waiting for {needle:?} on stdout; got {:?}", self.stdout());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    fn collect(&self, pick: impl Fn(&RelayEvent) -> Option<&str>) -> String {
        let events = self.events.lock().unwrap();
        events.iter().filter_map(|e| pick(e)).collect()
    }
}
