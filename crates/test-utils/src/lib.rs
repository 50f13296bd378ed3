//! Shared helpers for dagrun's integration tests.

pub mod builders;
pub mod fake_launcher;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

/// Budget for tests driven entirely by the fake launcher.
pub const FAKE_TIMEOUT: Duration = Duration::from_secs(2);

/// Budget for tests that spawn real processes and sleep between ticks.
pub const PROCESS_TIMEOUT: Duration = Duration::from_secs(20);

static INIT: Once = Once::new();

/// Install a test subscriber once per test binary.
///
/// Reads the same `DAGRUN_LOG` directives as the binary, defaulting to
/// `warn`, so `DAGRUN_LOG=dagrun::dag=debug cargo test` shows scheduler
/// decisions. Output goes through the test writer and only shows for failing
/// tests.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(dagrun::logging::LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        // Another subscriber may already be installed by the harness.
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Fail the test if `fut` does not finish within `limit`.
pub async fn with_timeout<F, T>(limit: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(value) => value,
        Err(_) => panic!("test did not finish within {limit:?}"),
    }
}
