use chrono::{DateTime, Utc};

pub type JobId = u64;
pub type ReportId = u64;

/// Server-side lifecycle of a report-generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Completed, failed and cancelled jobs never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// One backend processing step as last reported, e.g. `extract_text`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStep {
    pub step: String,
    /// Free-form server status; `pending` when the server omits it.
    pub status: String,
    /// Per-step progress in `[0, 100]`; zero when not reported.
    pub progress: f64,
    pub error: Option<String>,
}

impl TaskStep {
    pub const DEFAULT_STATUS: &'static str = "pending";

    pub fn new(step: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            status: status.into(),
            progress: 0.0,
            error: None,
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Read-only client copy of a job as last reported by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub id: JobId,
    pub status: JobStatus,
    /// Coarse server progress in `[0, 100]`.
    pub server_progress: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub report_ids: Vec<ReportId>,
    pub tasks: Vec<TaskStep>,
}

impl JobSnapshot {
    pub fn new(id: JobId, status: JobStatus) -> Self {
        Self {
            id,
            status,
            server_progress: 0.0,
            started_at: None,
            report_ids: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.server_progress = progress;
        self
    }

    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }

    pub fn with_reports(mut self, report_ids: Vec<ReportId>) -> Self {
        self.report_ids = report_ids;
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<TaskStep>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Report opened after completion; the job id stands in when none is linked.
    pub fn primary_report(&self) -> ReportId {
        self.report_ids.first().copied().unwrap_or(self.id)
    }
}
