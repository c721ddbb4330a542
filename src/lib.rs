pub mod analytics;
pub mod cli;
pub mod config;
pub mod device;
pub mod schedule;
pub mod ui;
pub mod web;

use tracing_subscriber::{EnvFilter, fmt};

/// Install the global diagnostics subscriber.
///
/// `RUST_LOG` wins over `level` when set. Calling this twice is harmless.
pub fn init_tracing(level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
