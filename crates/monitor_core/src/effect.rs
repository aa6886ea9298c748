use std::time::Duration;

use crate::{JobId, ReportId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchJob { job_id: JobId },
    StartPolling { job_id: JobId, interval: Duration },
    StopPolling,
    CancelJob { job_id: JobId },
    ScheduleNavigation { route: Route, delay: Duration },
    Navigate { route: Route },
}

/// Destination once a job has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Report(ReportId),
    Dashboard,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Report(report_id) => format!("/reports/{report_id}"),
            Route::Dashboard => "/dashboard".to_string(),
        }
    }
}
