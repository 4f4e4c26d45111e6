//! Tracing initialisation helpers for tests.
//!
//! Call [`init_test_tracing`] at the top of any test that emits tracing
//! events and wants them captured by the test harness. The subscriber is
//! initialised at most once per process, so calling it from every test
//! function is safe.

use quillstream_config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Initialise a tracing subscriber that writes to the test-harness writer.
///
/// Filter precedence: `RUST_LOG` when set, otherwise the workspace's
/// default logging level ([`LoggingConfig::default`]). Subsequent calls
/// are silently ignored.
///
/// # Example
///
/// ```ignore
/// #[tokio::test]
/// async fn my_test() {
///     quillstream_test_utils::tracing_setup::init_test_tracing();
///     tracing::info!("visible when RUST_LOG=info");
/// }
/// ```
pub fn init_test_tracing() {
    let default_level = LoggingConfig::default().level;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_test_writer()
        .try_init();
}
