//! Tracing configuration.
//!
//! `TYSCAN_LOG` takes precedence, then `RUST_LOG`, then the `--log-level`
//! flag. Values use the usual `EnvFilter` syntax (e.g. `debug`,
//! `tyscan_resolver=trace`). All output goes to stderr so it never
//! interferes with the catalog JSON on stdout.

use tracing_subscriber::EnvFilter;

use crate::args::LogLevel;

fn build_filter(level: LogLevel) -> EnvFilter {
    if let Ok(value) = std::env::var("TYSCAN_LOG") {
        EnvFilter::builder().parse_lossy(value)
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level.as_filter())
    }
}

/// Initialise the global tracing subscriber.
pub fn init_tracing(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(level))
        .with_writer(std::io::stderr)
        .init();
}
