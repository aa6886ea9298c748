use crate::{JobId, JobStatus, TaskStep};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitorViewModel {
    pub job_id: Option<JobId>,
    pub status: Option<JobStatus>,
    pub loading: bool,
    pub displayed_progress: f64,
    pub phase_label: String,
    pub remaining_label: String,
    pub polling: bool,
    pub terminal: bool,
    /// Backend steps in server order.
    pub tasks: Vec<TaskStep>,
    /// Blocks the whole view.
    pub load_error: Option<String>,
    /// Shown alongside progress; tracking continues.
    pub cancel_error: Option<String>,
    pub cancel_in_flight: bool,
    pub dirty: bool,
}
