//! Tracing subscriber setup for binaries built on rfidlink.

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence; `default_directive` (for example
/// `"info"` or `"rfidlink=debug"`) is used when it is unset or invalid.
/// Calling this more than once is harmless: later calls are ignored.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
