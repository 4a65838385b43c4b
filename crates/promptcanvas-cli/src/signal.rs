//! Ctrl+C handling.

use tokio::signal::ctrl_c;
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_SHUTDOWN;

/// Cancels `token` when Ctrl+C is pressed.
///
/// The run stops before its next task; calls already in flight finish.
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            result = ctrl_c() => match result {
                Ok(()) => {
                    tracing::info!(
                        target: TRACING_TARGET_SHUTDOWN,
                        "Received Ctrl+C signal, cancelling run"
                    );
                    token.cancel();
                }
                Err(e) => {
                    tracing::error!(
                        target: TRACING_TARGET_SHUTDOWN,
                        error = %e,
                        "Failed to install Ctrl+C handler"
                    );
                }
            },
            () = token.cancelled() => {}
        }
    });
}
