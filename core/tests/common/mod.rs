//! Helpers shared by the integration tests.

use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Route `tracing` output through the test harness so it is captured per test.
///
/// Defaults to `warn`; `RUST_LOG` overrides. Safe to call from every test.
pub fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
