use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::gateway::JobGateway;
use crate::scheduler::{PollHandle, PollScheduler, TickId};
use crate::{GatewayError, JobId, JobRecord};

/// Source of "now" for stamping observations.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    JobFetched {
        job_id: JobId,
        result: Result<JobRecord, GatewayError>,
        observed_at: DateTime<Utc>,
    },
    /// Only successful ticks are reported; failed ticks are logged and dropped.
    PollResolved {
        tick: TickId,
        job: JobRecord,
        observed_at: DateTime<Utc>,
    },
    CancelFinished {
        job_id: JobId,
        result: Result<(), GatewayError>,
    },
    NavigationDue,
}

/// Executes monitor commands against a gateway and reports back as events.
///
/// Owns at most one poll handle at a time.
pub struct EngineHandle {
    gateway: Arc<dyn JobGateway>,
    runtime: Handle,
    clock: Clock,
    event_tx: mpsc::UnboundedSender<EngineEvent>,
    poll: Mutex<Option<PollHandle>>,
    shutdown: CancellationToken,
}

impl EngineHandle {
    pub fn new(
        gateway: Arc<dyn JobGateway>,
        runtime: Handle,
        clock: Clock,
    ) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let handle = Self {
            gateway,
            runtime,
            clock,
            event_tx,
            poll: Mutex::new(None),
            shutdown: CancellationToken::new(),
        };
        (handle, event_rx)
    }

    pub fn fetch_job(&self, job_id: JobId) {
        let gateway = self.gateway.clone();
        let clock = self.clock.clone();
        let event_tx = self.event_tx.clone();
        self.spawn_until_shutdown(async move {
            let result = gateway.fetch_job(job_id).await;
            let _ = event_tx.send(EngineEvent::JobFetched {
                job_id,
                result,
                observed_at: clock(),
            });
        });
    }

    /// Replaces any running poll loop with a new one for `job_id`.
    pub fn start_polling(&self, job_id: JobId, interval: Duration) {
        self.stop_polling();
        if self.shutdown.is_cancelled() {
            return;
        }

        let gateway = self.gateway.clone();
        let clock = self.clock.clone();
        let event_tx = self.event_tx.clone();
        let _enter = self.runtime.enter();
        let handle = PollScheduler::start(
            interval,
            move |_tick| {
                let gateway = gateway.clone();
                async move { gateway.fetch_job(job_id).await }
            },
            move |tick, result: Result<JobRecord, GatewayError>| match result {
                Ok(job) => {
                    let _ = event_tx.send(EngineEvent::PollResolved {
                        tick,
                        job,
                        observed_at: clock(),
                    });
                }
                Err(err) if err.is_transient() => {
                    engine_warn!("Poll tick {} for job {} failed: {}", tick, job_id, err);
                }
                Err(err) => {
                    engine_error!(
                        "Poll tick {} for job {} failed permanently: {}",
                        tick,
                        job_id,
                        err
                    );
                }
            },
        );
        engine_info!("Polling job {} every {:?}", job_id, interval);
        *self.poll.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    /// Stops the active poll loop, if any. Safe to call repeatedly.
    pub fn stop_polling(&self) {
        let handle = self
            .poll
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.stop();
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poll
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_stopped())
    }

    pub fn cancel_job(&self, job_id: JobId) {
        let gateway = self.gateway.clone();
        let event_tx = self.event_tx.clone();
        self.spawn_until_shutdown(async move {
            let result = gateway.cancel_job(job_id).await;
            let _ = event_tx.send(EngineEvent::CancelFinished { job_id, result });
        });
    }

    /// Emits `NavigationDue` once after `delay`.
    pub fn schedule_navigation(&self, delay: Duration) {
        let event_tx = self.event_tx.clone();
        self.spawn_until_shutdown(async move {
            tokio::time::sleep(delay).await;
            let _ = event_tx.send(EngineEvent::NavigationDue);
        });
    }

    /// Stops polling and abandons outstanding calls and timers.
    pub fn shutdown(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.shutdown.cancel();
        self.stop_polling();
        engine_debug!("Engine shut down");
    }

    fn spawn_until_shutdown<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = task => {}
            }
        });
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
