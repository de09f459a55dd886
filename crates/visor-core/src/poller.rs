// Fixed-rate polling primitive.
//
// A `Poller` invokes a fetch function immediately and then every period,
// measured from the start of the previous tick. Each tick runs in its own
// task, so a slow fetch never delays the schedule and several ticks may be
// in flight. Results reach the subscriber through the retirement latch:
// after `PollHandle::stop()` returns, the subscriber is never called again.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::lifecycle::{Liveness, Ordering};

/// Builder for a polling loop.
#[derive(Debug, Clone)]
pub struct Poller {
    period: Duration,
    ordering: Ordering,
    name: &'static str,
}

impl Poller {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            ordering: Ordering::default(),
            name: "poll",
        }
    }

    #[must_use]
    pub fn ordering(mut self, ordering: Ordering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Label used in log events.
    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start polling. Must be called inside a tokio runtime.
    ///
    /// `on_result` receives every result, failures included; a failed fetch
    /// never stops the loop. It runs while the handle's latch is held, so it
    /// must not stop or drop this poller's own handle.
    pub fn start<T, F, Fut, S>(self, fetch: F, on_result: S) -> PollHandle
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        S: Fn(T) + Send + Sync + 'static,
    {
        let cancel = CancellationToken::new();
        let liveness = Liveness::default();
        debug!(poller = self.name, period_ms = self.period.as_millis(), "poller started");

        tokio::spawn(tick_loop(
            self,
            fetch,
            Arc::new(on_result),
            cancel.clone(),
            liveness.clone(),
        ));

        PollHandle { cancel, liveness }
    }
}

async fn tick_loop<T, F, Fut, S>(
    poller: Poller,
    fetch: F,
    on_result: Arc<S>,
    cancel: CancellationToken,
    liveness: Liveness,
) where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
    S: Fn(T) + Send + Sync + 'static,
{
    // Default missed-tick behaviour is `Burst`: the schedule stays anchored
    // to the start instant even if the runtime stalls.
    let mut interval = tokio::time::interval(poller.period);
    let mut generation: u64 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                generation += 1;
                let Some(pending) = liveness.run_if_live(&fetch) else { break };
                trace!(poller = poller.name, generation, "tick");

                let liveness = liveness.clone();
                let on_result = Arc::clone(&on_result);
                let name = poller.name;
                let ordering = poller.ordering;
                let tick = generation;
                tokio::spawn(async move {
                    let value = pending.await;
                    if !liveness.deliver(tick, ordering, || on_result(value)) {
                        trace!(poller = name, generation = tick, "result discarded");
                    }
                });
            }
        }
    }

    debug!(poller = poller.name, ticks = generation, "poller stopped");
}

/// Owner handle of a running poll loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct PollHandle {
    cancel: CancellationToken,
    liveness: Liveness,
}

impl PollHandle {
    /// Retire the loop. Synchronous and idempotent; in-flight fetches keep
    /// running in the background but their results are discarded.
    pub fn stop(&self) {
        self.cancel.cancel();
        self.liveness.retire();
    }

    pub fn is_stopped(&self) -> bool {
        self.liveness.is_retired()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
