//! Tracing setup for the command-line tool.
//!
//! The library only emits `tracing` events; embedding hosts install their own
//! subscriber.

use tracing_subscriber::EnvFilter;

/// Install a compact stderr subscriber. `RUST_LOG` wins when set, otherwise
/// `default_level` applies.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(default_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}
