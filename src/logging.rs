//! Diagnostic logging.
//!
//! Logs go to stderr so stdout stays usable for piping (`caws login |
//! pbcopy`).  The filter comes from `CAWS_LOG` and defaults to `warn`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "CAWS_LOG";

/// Initializes the tracing subscriber.  Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .try_init();
}
