//! Fixed-cadence polling with switch semantics.
//!
//! Every period a new tick is issued. Issuing a tick aborts the previous
//! tick's call if it is still running, and only the most recently issued
//! tick may deliver a result. Stopping is idempotent and, once `stop`
//! returns, no tick is issued and no result is delivered.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use engine_logging::{engine_debug, engine_trace};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Sequence number of a poll tick, starting at 1.
pub type TickId = u64;

#[derive(Default)]
struct Gate {
    stopped: bool,
    latest: TickId,
    in_flight: Option<JoinHandle<()>>,
}

fn lock(gate: &Mutex<Gate>) -> MutexGuard<'_, Gate> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner's handle to a running poll loop. Dropping it stops the loop.
pub struct PollHandle {
    gate: Arc<Mutex<Gate>>,
    cancel: CancellationToken,
}

impl PollHandle {
    pub fn stop(&self) {
        let mut gate = lock(&self.gate);
        if gate.stopped {
            return;
        }
        gate.stopped = true;
        if let Some(call) = gate.in_flight.take() {
            call.abort();
        }
        drop(gate);
        self.cancel.cancel();
        engine_debug!("Poll scheduler stopped");
    }

    pub fn is_stopped(&self) -> bool {
        lock(&self.gate).stopped
    }

    /// Id of the most recently issued tick, 0 before the first one.
    pub fn latest_tick(&self) -> TickId {
        lock(&self.gate).latest
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct PollScheduler;

impl PollScheduler {
    /// Starts polling on the current tokio runtime.
    ///
    /// `tick` builds the call for a tick; `on_result` receives its output if
    /// the tick is still the latest when the call resolves. `on_result` runs
    /// while the scheduler's gate is held, so it must not block or call back
    /// into the handle.
    pub fn start<T, F, Fut, S>(interval: Duration, mut tick: F, on_result: S) -> PollHandle
    where
        T: Send + 'static,
        F: FnMut(TickId) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        S: Fn(TickId, T) + Send + Sync + 'static,
    {
        let gate = Arc::new(Mutex::new(Gate::default()));
        let cancel = CancellationToken::new();
        let on_result = Arc::new(on_result);

        let loop_gate = gate.clone();
        let loop_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = loop_cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let mut guard = lock(&loop_gate);
                if guard.stopped {
                    break;
                }
                guard.latest += 1;
                let tick_id = guard.latest;
                if let Some(previous) = guard.in_flight.take() {
                    if !previous.is_finished() {
                        engine_debug!("Tick {} supersedes an unresolved call", tick_id);
                    }
                    previous.abort();
                }
                engine_trace!("Issuing poll tick {}", tick_id);

                let call = tick(tick_id);
                let deliver_gate = loop_gate.clone();
                let on_result = on_result.clone();
                guard.in_flight = Some(tokio::spawn(async move {
                    let output = call.await;
                    let gate = lock(&deliver_gate);
                    if gate.stopped || gate.latest != tick_id {
                        engine_debug!("Dropping result of superseded tick {}", tick_id);
                        return;
                    }
                    on_result(tick_id, output);
                }));
            }
        });

        PollHandle { gate, cancel }
    }
}
