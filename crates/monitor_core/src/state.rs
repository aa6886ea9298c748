use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::estimate::{format_remaining, Estimate, EstimatorConfig};
use crate::view_model::MonitorViewModel;
use crate::{JobId, JobSnapshot, JobStatus, Route, TickId};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2_000);
/// Time the terminal message stays on screen before navigating away.
pub const DEFAULT_NAVIGATION_DELAY: Duration = Duration::from_millis(2_000);

const LABEL_LOADING: &str = "Initializing...";
const LABEL_PENDING: &str = "Waiting for the job to start...";
const LABEL_COMPLETED: &str = "All tasks completed!";
const LABEL_FAILED: &str = "Job failed";
const LABEL_CANCELLED: &str = "Job cancelled";
const REMAINING_UNKNOWN: &str = "Calculating...";

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub navigation_delay: Duration,
    pub estimator: EstimatorConfig,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            navigation_delay: DEFAULT_NAVIGATION_DELAY,
            estimator: EstimatorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationState {
    #[default]
    Idle,
    Scheduled(Route),
    Done(Route),
}

/// Everything the monitor knows about one attached job.
///
/// `polling` mirrors ownership of the engine's poll handle: it is set when
/// `StartPolling` is emitted and cleared exactly when `StopPolling` is.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorState {
    settings: MonitorSettings,
    job_id: Option<JobId>,
    attached_at: Option<DateTime<Utc>>,
    job: Option<JobSnapshot>,
    loading: bool,
    displayed_progress: f64,
    phase_label: String,
    remaining_label: String,
    seen_running: bool,
    polling: bool,
    last_tick: TickId,
    terminal_reached: bool,
    navigation: NavigationState,
    cancel_in_flight: bool,
    load_error: Option<String>,
    cancel_error: Option<String>,
    detached: bool,
    dirty: bool,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::with_settings(MonitorSettings::default())
    }
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: MonitorSettings) -> Self {
        Self {
            settings,
            job_id: None,
            attached_at: None,
            job: None,
            loading: false,
            displayed_progress: 0.0,
            phase_label: LABEL_LOADING.to_string(),
            remaining_label: REMAINING_UNKNOWN.to_string(),
            seen_running: false,
            polling: false,
            last_tick: 0,
            terminal_reached: false,
            navigation: NavigationState::Idle,
            cancel_in_flight: false,
            load_error: None,
            cancel_error: None,
            detached: false,
            dirty: false,
        }
    }

    pub fn view(&self) -> MonitorViewModel {
        MonitorViewModel {
            job_id: self.job_id,
            status: self.job.as_ref().map(|job| job.status),
            loading: self.loading,
            displayed_progress: self.displayed_progress,
            phase_label: self.phase_label.clone(),
            remaining_label: self.remaining_label.clone(),
            polling: self.polling,
            terminal: self.terminal_reached,
            tasks: self
                .job
                .as_ref()
                .map(|job| job.tasks.clone())
                .unwrap_or_default(),
            load_error: self.load_error.clone(),
            cancel_error: self.cancel_error.clone(),
            cancel_in_flight: self.cancel_in_flight,
            dirty: self.dirty,
        }
    }

    /// Returns whether the view changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn job_id(&self) -> Option<JobId> {
        self.job_id
    }

    pub fn job(&self) -> Option<&JobSnapshot> {
        self.job.as_ref()
    }

    pub fn displayed_progress(&self) -> f64 {
        self.displayed_progress
    }

    pub fn phase_label(&self) -> &str {
        &self.phase_label
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_polling(&self) -> bool {
        self.polling
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal_reached
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn last_applied_tick(&self) -> TickId {
        self.last_tick
    }

    pub fn navigation(&self) -> NavigationState {
        self.navigation
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn cancel_error(&self) -> Option<&str> {
        self.cancel_error.as_deref()
    }

    pub fn is_cancel_in_flight(&self) -> bool {
        self.cancel_in_flight
    }

    pub(crate) fn attach(&mut self, job_id: JobId, at: DateTime<Utc>) {
        self.job_id = Some(job_id);
        self.attached_at = Some(at);
        self.loading = true;
        self.dirty = true;
    }

    pub(crate) fn finish_loading(&mut self) {
        self.loading = false;
        self.dirty = true;
    }

    pub(crate) fn fail_loading(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.load_error = Some(message.into());
        self.dirty = true;
    }

    pub(crate) fn set_job(&mut self, job: JobSnapshot) {
        self.job = Some(job);
        self.dirty = true;
    }

    pub(crate) fn record_tick(&mut self, tick: TickId) {
        self.last_tick = tick;
    }

    /// Elapsed processing time: from the server start when known, else from attach.
    pub(crate) fn elapsed(
        &self,
        started_at: Option<DateTime<Utc>>,
        observed_at: DateTime<Utc>,
    ) -> Duration {
        started_at
            .or(self.attached_at)
            .and_then(|origin| (observed_at - origin).to_std().ok())
            .unwrap_or(Duration::ZERO)
    }

    pub(crate) fn apply_estimate(&mut self, estimate: Estimate) {
        self.seen_running = true;
        self.displayed_progress = estimate.displayed;
        self.phase_label = estimate.phase_label;
        self.remaining_label = format_remaining(estimate.remaining);
        self.dirty = true;
    }

    pub(crate) fn mark_pending(&mut self) {
        // A job seen running keeps its phase even if the server reports pending again.
        if !self.seen_running {
            self.phase_label = LABEL_PENDING.to_string();
            self.dirty = true;
        }
    }

    pub(crate) fn reach_terminal(&mut self, status: JobStatus) {
        self.terminal_reached = true;
        match status {
            JobStatus::Completed => {
                self.displayed_progress = 100.0;
                self.phase_label = LABEL_COMPLETED.to_string();
                self.remaining_label = format_remaining(Duration::ZERO);
            }
            JobStatus::Failed => self.phase_label = LABEL_FAILED.to_string(),
            JobStatus::Cancelled => self.phase_label = LABEL_CANCELLED.to_string(),
            JobStatus::Pending | JobStatus::Running => {}
        }
        self.dirty = true;
    }

    pub(crate) fn start_polling(&mut self) {
        self.polling = true;
        self.dirty = true;
    }

    pub(crate) fn stop_polling(&mut self) {
        self.polling = false;
        self.dirty = true;
    }

    pub(crate) fn schedule_navigation(&mut self, route: Route) {
        self.navigation = NavigationState::Scheduled(route);
    }

    pub(crate) fn complete_navigation(&mut self) -> Option<Route> {
        match self.navigation {
            NavigationState::Scheduled(route) => {
                self.navigation = NavigationState::Done(route);
                Some(route)
            }
            NavigationState::Idle | NavigationState::Done(_) => None,
        }
    }

    pub(crate) fn begin_cancel(&mut self) {
        self.cancel_in_flight = true;
        self.cancel_error = None;
        self.dirty = true;
    }

    pub(crate) fn finish_cancel(&mut self, error: Option<String>) {
        self.cancel_in_flight = false;
        self.cancel_error = error;
        self.dirty = true;
    }

    pub(crate) fn detach(&mut self) {
        self.detached = true;
        self.dirty = true;
    }
}
