use std::sync::Arc;

use engine_logging::{engine_debug, engine_info};
use monitor_core::{
    CancelOutcome, Effect, JobSnapshot, JobStatus, LoadFailure, Msg, Route, TaskStep,
};
use monitor_engine::{EngineEvent, EngineHandle, GatewayError, JobRecord, JobState, TaskRecord};
use tokio::sync::mpsc;

use super::navigation::Navigator;

/// Executes core effects on the engine and feeds engine events back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
    navigator: Arc<dyn Navigator>,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        events: mpsc::UnboundedReceiver<EngineEvent>,
        msg_tx: mpsc::UnboundedSender<Msg>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        spawn_event_loop(events, msg_tx);
        Self { engine, navigator }
    }

    /// Runs effects in order; returns the route if navigation happened.
    pub fn run(&self, effects: Vec<Effect>) -> Option<Route> {
        let mut navigated = None;
        for effect in effects {
            engine_debug!("Effect {:?}", effect);
            match effect {
                Effect::FetchJob { job_id } => self.engine.fetch_job(job_id),
                Effect::StartPolling { job_id, interval } => {
                    self.engine.start_polling(job_id, interval)
                }
                Effect::StopPolling => self.engine.stop_polling(),
                Effect::CancelJob { job_id } => {
                    engine_info!("Requesting cancellation of job {}", job_id);
                    self.engine.cancel_job(job_id);
                }
                Effect::ScheduleNavigation { route, delay } => {
                    engine_info!("Opening {} in {:?}", route.path(), delay);
                    self.engine.schedule_navigation(delay);
                }
                Effect::Navigate { route } => {
                    engine_info!("Navigating to {}", route.path());
                    self.navigator.navigate_to(route);
                    navigated = Some(route);
                }
            }
        }
        navigated
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

fn spawn_event_loop(
    mut events: mpsc::UnboundedReceiver<EngineEvent>,
    msg_tx: mpsc::UnboundedSender<Msg>,
) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if msg_tx.send(map_event(event)).is_err() {
                break;
            }
        }
    });
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::JobFetched {
            result,
            observed_at,
            ..
        } => match result {
            Ok(record) => Msg::JobLoaded {
                job: map_job(record),
                observed_at,
            },
            Err(err) => Msg::JobLoadFailed {
                failure: map_load_failure(err),
            },
        },
        EngineEvent::PollResolved {
            tick,
            job,
            observed_at,
        } => Msg::PollResolved {
            tick,
            job: map_job(job),
            observed_at,
        },
        EngineEvent::CancelFinished { result, .. } => Msg::CancelFinished {
            outcome: match result {
                Ok(()) => CancelOutcome::Accepted,
                Err(GatewayError::Conflict(_)) => CancelOutcome::Conflict,
                Err(err) => CancelOutcome::Failed(err.to_string()),
            },
        },
        EngineEvent::NavigationDue => Msg::NavigationDue,
    }
}

pub(crate) fn map_job(record: JobRecord) -> JobSnapshot {
    JobSnapshot {
        id: record.id,
        status: map_status(record.status),
        server_progress: percent_or_zero(record.progress),
        started_at: record.started_at,
        report_ids: record.reports.into_iter().map(|report| report.id).collect(),
        tasks: record.tasks.into_iter().map(map_task).collect(),
    }
}

fn map_task(record: TaskRecord) -> TaskStep {
    TaskStep {
        step: record.step,
        status: record
            .status
            .unwrap_or_else(|| TaskStep::DEFAULT_STATUS.to_string()),
        progress: record.progress.map_or(0.0, percent_or_zero),
        error: record.error,
    }
}

fn percent_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn map_status(state: JobState) -> JobStatus {
    match state {
        JobState::Pending => JobStatus::Pending,
        JobState::Running => JobStatus::Running,
        JobState::Completed => JobStatus::Completed,
        JobState::Failed => JobStatus::Failed,
        JobState::Cancelled => JobStatus::Cancelled,
    }
}

fn map_load_failure(err: GatewayError) -> LoadFailure {
    match err {
        GatewayError::NotFound(_) => LoadFailure::NotFound,
        other => LoadFailure::Network(other.to_string()),
    }
}
