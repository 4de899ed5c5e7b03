//! Tracing/logging setup shared by hosts and test harnesses.
//!
//! The domain crates stay free of log calls; whatever embeds them (a web
//! host, a worker, an integration test) initializes the subscriber here.

use tracing_subscriber::EnvFilter;

/// Initialize process-wide tracing/logging.
///
/// JSON logs + timestamps, filtered via `RUST_LOG` (default `info`).
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    install(filter);
}

/// Initialize with an explicit filter directive, ignoring the environment.
///
/// Useful for tests and hosts that configure logging themselves
/// (e.g. `init_with_directive("storefront_catalog=debug")`).
pub fn init_with_directive(directive: &str) {
    install(EnvFilter::new(directive));
}

fn install(filter: EnvFilter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
