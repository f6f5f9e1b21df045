//! Tracing setup for the `ww` binary.
//!
//! Diagnostics go to stderr; stdout carries only reports, listings and
//! exports.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the subscriber used by `ww`
///
/// Quiet unless something goes wrong: only warnings and errors are shown
/// unless RUST_LOG asks for more (e.g. `RUST_LOG=ww_core=debug` to see
/// store opens and property checks).
pub fn init() {
    init_with_level("warn")
}

/// Install the subscriber with `default_level` as the filter used when
/// RUST_LOG is unset or unparsable.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Debug-level logging routed through the test harness, so store and
/// service tests show their SQL decisions on failure
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
