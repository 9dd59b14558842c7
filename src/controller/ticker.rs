use std::{future::Future, sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info_span, Instrument};

use crate::utils::clock::Clock;

/// Repeating task that calls `on_tick` every `period` until it's stopped or the callback asks to
/// stop. Dropping the ticker cancels it as well, so a ticker can't outlive its owner.
pub struct Ticker {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Ticks are scheduled relative to the moment of spawning, so a slow callback doesn't shift
    /// the following ticks. The first tick happens one `period` after spawning. When a whole
    /// period or more was missed the schedule restarts from the late tick.
    pub fn spawn<F, Fut>(period: Duration, clock: Arc<dyn Clock>, mut on_tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let span = info_span!("Ticker", ?period);

        let handle = tokio::spawn(
            async move {
                let mut tick_point = clock.instant();
                loop {
                    tick_point += period;

                    tokio::select! {
                        biased;
                        _ = cancelled.cancelled() => break,
                        _ = clock.sleep_until(tick_point) => (),
                    }

                    // After a suspend the schedule is far behind, missed ticks are dropped rather
                    // than fired back to back.
                    let now = clock.instant();
                    if now >= tick_point + period {
                        debug!("Skipping ticks missed since {tick_point:?}");
                        tick_point = now;
                    }

                    let keep_going = tokio::select! {
                        biased;
                        _ = cancelled.cancelled() => false,
                        keep_going = on_tick() => keep_going,
                    };
                    if !keep_going {
                        break;
                    }
                }
                debug!("Ticker finished");
            }
            .instrument(span),
        );

        Self {
            token,
            handle: Some(handle),
        }
    }

    /// Cancels the ticker and waits until the task is gone. No tick runs after this returns.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!("Ticker task failed {e:?}");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
