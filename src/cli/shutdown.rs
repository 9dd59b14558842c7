use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cancels `cancelation` once Ctrl-C is received.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(_) => info!("Received Ctrl-C"),
                Err(e) => error!("Failed to listen for Ctrl-C {e:?}"),
            }
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}
