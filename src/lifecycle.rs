//! Teardown wiring
//!
//! Browsers signal teardown twice (page hidden and page unload) because
//! neither signal alone covers every navigation path; a native process sees
//! Ctrl+C and SIGTERM instead. Both routes point at the same flush, and the
//! buffer's idempotency guard is what makes the dual wiring safe rather
//! than a source of duplicate batches.

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::info;

use crate::buffer::InteractionLogBuffer;

/// Resolves when the process receives a teardown signal (Ctrl+C or, on
/// unix, SIGTERM).
pub async fn teardown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Run until a teardown signal arrives, flush the buffer, and grant the
/// delivery a bounded grace period.
///
/// A second teardown signal during the grace window triggers a second
/// flush: that is the retry path when the first tracked attempt failed and
/// re-armed the guard. (When the first attempt succeeded, the guard makes
/// the second flush a no-op.)
pub async fn run_until_teardown(buffer: Arc<InteractionLogBuffer>, grace: Duration) {
    teardown_signal().await;
    info!("Teardown signal received; flushing interaction buffer");
    buffer.flush();

    tokio::select! {
        _ = buffer.drain(grace) => {}
        _ = teardown_signal() => {
            info!("Second teardown signal; flushing again");
            buffer.flush();
            buffer.drain(grace).await;
        }
    }
}
