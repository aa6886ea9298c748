//! Report monitor core: pure job-progress state machine and view-model helpers.
mod effect;
mod estimate;
mod job;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, Route};
pub use estimate::{
    format_remaining, Estimate, EstimatorConfig, PhaseBreakpoint, DEFAULT_ASSUMED_TOTAL,
    HEURISTIC_CAP,
};
pub use job::{JobId, JobSnapshot, JobStatus, ReportId, TaskStep};
pub use msg::{CancelOutcome, LoadFailure, Msg, TickId};
pub use state::{
    MonitorSettings, MonitorState, NavigationState, DEFAULT_NAVIGATION_DELAY,
    DEFAULT_POLL_INTERVAL,
};
pub use update::update;
pub use view_model::MonitorViewModel;
