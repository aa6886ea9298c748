use chrono::{DateTime, Utc};

use crate::{JobId, JobSnapshot};

/// Sequence number of a poll tick; later ticks carry larger ids.
pub type TickId = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// The monitor view opened for a job.
    Attached { job_id: JobId, at: DateTime<Utc> },
    /// Initial fetch succeeded.
    JobLoaded {
        job: JobSnapshot,
        observed_at: DateTime<Utc>,
    },
    /// Initial fetch failed; the view cannot be shown.
    JobLoadFailed { failure: LoadFailure },
    /// A poll tick resolved with a fresh snapshot.
    PollResolved {
        tick: TickId,
        job: JobSnapshot,
        observed_at: DateTime<Utc>,
    },
    /// User asked to cancel the job.
    CancelClicked,
    /// The cancel request came back from the gateway.
    CancelFinished { outcome: CancelOutcome },
    /// The post-terminal navigation delay elapsed.
    NavigationDue,
    /// The user left the view.
    Detached,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    NotFound,
    Network(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    Accepted,
    /// The job was already terminal server-side.
    Conflict,
    Failed(String),
}
