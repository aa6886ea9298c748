use chrono::{DateTime, Utc};
use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::{
    CancelOutcome, Effect, JobSnapshot, JobStatus, LoadFailure, MonitorState, Msg, Route,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: MonitorState, msg: Msg) -> (MonitorState, Vec<Effect>) {
    // After detach nothing may touch the state, including late gateway results.
    if state.is_detached() {
        engine_debug!("Ignoring {:?} after detach", msg);
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::Attached { job_id, at } => {
            if state.job_id().is_some() {
                return (state, Vec::new());
            }
            state.attach(job_id, at);
            vec![Effect::FetchJob { job_id }]
        }
        Msg::JobLoaded { job, observed_at } => {
            if !state.is_loading() || !belongs_to(&state, &job) {
                return (state, Vec::new());
            }
            state.finish_loading();
            let job_id = job.id;
            let mut effects = apply_snapshot(&mut state, job, observed_at);
            if !state.is_terminal() {
                state.start_polling();
                effects.push(Effect::StartPolling {
                    job_id,
                    interval: state.settings().poll_interval,
                });
            }
            effects
        }
        Msg::JobLoadFailed { failure } => {
            if !state.is_loading() {
                return (state, Vec::new());
            }
            let message = match failure {
                LoadFailure::NotFound => "Job not found".to_string(),
                LoadFailure::Network(detail) => {
                    engine_warn!("Initial job fetch failed: {}", detail);
                    "Failed to load job progress".to_string()
                }
            };
            state.fail_loading(message);
            Vec::new()
        }
        Msg::PollResolved {
            tick,
            job,
            observed_at,
        } => {
            if state.is_terminal() || !state.is_polling() {
                engine_debug!("Dropping tick {} result: polling is over", tick);
                return (state, Vec::new());
            }
            if tick <= state.last_applied_tick() {
                engine_debug!(
                    "Discarding stale tick {} (already applied {})",
                    tick,
                    state.last_applied_tick()
                );
                return (state, Vec::new());
            }
            if !belongs_to(&state, &job) {
                return (state, Vec::new());
            }
            state.record_tick(tick);
            apply_snapshot(&mut state, job, observed_at)
        }
        Msg::CancelClicked => match state.job_id() {
            Some(job_id)
                if state.job().is_some()
                    && !state.is_terminal()
                    && !state.is_cancel_in_flight() =>
            {
                state.begin_cancel();
                vec![Effect::CancelJob { job_id }]
            }
            _ => Vec::new(),
        },
        Msg::CancelFinished { outcome } => {
            // The next poll decides the outcome; nothing here changes job state.
            match outcome {
                CancelOutcome::Accepted => {
                    engine_info!("Cancel accepted; waiting for the next poll");
                    state.finish_cancel(None);
                }
                CancelOutcome::Conflict => {
                    engine_info!("Cancel rejected: job already finished");
                    state.finish_cancel(None);
                }
                CancelOutcome::Failed(detail) => {
                    engine_warn!("Cancel request failed: {}", detail);
                    state.finish_cancel(Some("Failed to cancel job".to_string()));
                }
            }
            Vec::new()
        }
        Msg::NavigationDue => match state.complete_navigation() {
            Some(route) => vec![Effect::Navigate { route }],
            None => Vec::new(),
        },
        Msg::Detached => {
            let was_polling = state.is_polling();
            state.detach();
            if was_polling {
                state.stop_polling();
                vec![Effect::StopPolling]
            } else {
                Vec::new()
            }
        }
    };

    (state, effects)
}

fn belongs_to(state: &MonitorState, job: &JobSnapshot) -> bool {
    let matches = state.job_id() == Some(job.id);
    if !matches {
        engine_warn!(
            "Ignoring snapshot for job {} while monitoring {:?}",
            job.id,
            state.job_id()
        );
    }
    matches
}

fn apply_snapshot(
    state: &mut MonitorState,
    job: JobSnapshot,
    observed_at: DateTime<Utc>,
) -> Vec<Effect> {
    let mut effects = Vec::new();
    match job.status {
        status if status.is_terminal() => {
            engine_info!("Job {} reached terminal status {:?}", job.id, status);
            state.reach_terminal(status);
            if state.is_polling() {
                state.stop_polling();
                effects.push(Effect::StopPolling);
            }
            let route = match status {
                JobStatus::Completed => Route::Report(job.primary_report()),
                _ => Route::Dashboard,
            };
            state.schedule_navigation(route);
            effects.push(Effect::ScheduleNavigation {
                route,
                delay: state.settings().navigation_delay,
            });
        }
        JobStatus::Running => {
            let elapsed = state.elapsed(job.started_at, observed_at);
            let estimate = state.settings().estimator.estimate(
                elapsed,
                state.displayed_progress(),
                job.server_progress,
            );
            state.apply_estimate(estimate);
        }
        _ => state.mark_pending(),
    }
    state.set_job(job);
    effects
}
