//! Report monitor engine: job gateway, poll scheduling and effect execution.
mod engine;
mod gateway;
mod scheduler;
mod types;

pub use engine::{system_clock, Clock, EngineEvent, EngineHandle};
pub use gateway::{GatewaySettings, JobGateway, ReqwestGateway};
pub use scheduler::{PollHandle, PollScheduler, TickId};
pub use types::{
    parse_timestamp, GatewayError, JobId, JobRecord, JobState, ReportRef, TaskRecord,
};
