//! Diagnostic logging setup.
//!
//! The library only emits `tracing` events; the binary installs a
//! subscriber that writes them to stderr.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Environment variable holding the log filter (`EnvFilter` syntax).
pub const LOG_ENV: &str = "QS_LOG";

/// Install the stderr subscriber.  Safe to call more than once.
///
/// The filter comes from `QS_LOG` when set; otherwise `debug` turns on
/// debug-level events and the default is `warn`.
pub fn init_tracing(debug: bool) {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(filter)
            .init();
    });
}

fn default_directive(debug: bool) -> &'static str {
    if debug { "debug" } else { "warn" }
}
