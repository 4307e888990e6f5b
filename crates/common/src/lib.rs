mod backoff;
mod env;

pub use backoff::ExponentialBackoff;
pub use env::{env_string, parse_env, parse_env_millis};

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset. The book owns stdout, so only
/// warnings and errors reach the terminal by default.
const DEFAULT_LOG_FILTER: &str = "warn";

/// Install the global tracing subscriber.
///
/// Logs go to stderr so they never interleave with the book display on
/// stdout. Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
