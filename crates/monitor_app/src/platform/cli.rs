use std::path::PathBuf;

use clap::Parser;

use super::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(name = "report-monitor")]
#[command(about = "Follow a report-generation job until it finishes", long_about = None)]
pub struct Args {
    /// Id of the job to monitor
    #[arg(long)]
    pub job: u64,

    /// RON configuration file (every field optional)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base URL of the report API, e.g. http://localhost:8000
    #[arg(long)]
    pub api_base_url: Option<String>,

    /// Bearer token sent with every request
    #[arg(long)]
    pub token: Option<String>,

    /// Poll period in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Assumed job duration in milliseconds, used for the progress estimate
    #[arg(long)]
    pub assumed_total_ms: Option<u64>,

    /// Where log output goes
    #[arg(long, value_enum, default_value = "file")]
    pub log: LogDestination,
}
