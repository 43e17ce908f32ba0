#![allow(dead_code, unused_imports)]

pub use execpp_test_utils::recorder::EventRecorder;
pub use execpp_test_utils::scripts::{shell, ScriptDir};
pub use execpp_test_utils::{init_tracing, with_timeout};

use execpp::relay::{ProcessRelay, RelayConfig};

/// A relay that runs `/bin/sh <script>`.
pub fn shell_relay() -> ProcessRelay {
    ProcessRelay::new(shell())
}

/// Same as [`shell_relay`] with a custom config.
pub fn shell_relay_with(config: RelayConfig) -> ProcessRelay {
    ProcessRelay::new(shell()).with_config(config)
}
