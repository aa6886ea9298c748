//! Time-based progress heuristic.
//!
//! The backend reports coarse status only, so the displayed percentage is
//! blended from elapsed time against an assumed total duration and the
//! server's own progress value. The heuristic alone never reaches 100.

use std::time::Duration;

/// Assumed wall-clock duration of a report job, used only as an estimation prior.
pub const DEFAULT_ASSUMED_TOTAL: Duration = Duration::from_millis(240_000);

/// Upper bound for the time-derived percentage. Only a confirmed completion shows 100.
pub const HEURISTIC_CAP: f64 = 95.0;

/// Progress strictly below `below` is labelled `label`.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseBreakpoint {
    pub below: f64,
    pub label: String,
}

impl PhaseBreakpoint {
    pub fn new(below: f64, label: impl Into<String>) -> Self {
        Self {
            below,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    pub assumed_total: Duration,
    pub heuristic_cap: f64,
    /// Checked in order; the first breakpoint above the progress wins.
    pub phases: Vec<PhaseBreakpoint>,
    /// Label once progress is past every breakpoint.
    pub final_phase: String,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            assumed_total: DEFAULT_ASSUMED_TOTAL,
            heuristic_cap: HEURISTIC_CAP,
            phases: vec![
                PhaseBreakpoint::new(20.0, "Ingestion Agent: Analyzing documents..."),
                PhaseBreakpoint::new(40.0, "Web Research Agent: Searching online sources..."),
                PhaseBreakpoint::new(60.0, "Synthesis Agent: Structuring report..."),
                PhaseBreakpoint::new(80.0, "Citation Agent: Verifying sources..."),
            ],
            final_phase: "Compliance Agent: Finalizing report...".to_string(),
        }
    }
}

/// Result of blending the heuristic with server progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    /// Time-only percentage in `[0, heuristic_cap]`.
    pub heuristic: f64,
    /// Ratcheted value to display, in `[0, 100]`.
    pub displayed: f64,
    pub phase_label: String,
    pub remaining: Duration,
}

impl EstimatorConfig {
    pub fn with_assumed_total(mut self, assumed_total: Duration) -> Self {
        self.assumed_total = assumed_total;
        self
    }

    /// Percentage implied by elapsed time alone.
    pub fn heuristic(&self, elapsed: Duration) -> f64 {
        let cap = self.heuristic_cap.clamp(0.0, 100.0);
        if self.assumed_total.is_zero() {
            return cap;
        }
        let ratio = elapsed.as_secs_f64() / self.assumed_total.as_secs_f64();
        (ratio * 100.0).min(cap)
    }

    pub fn phase_for(&self, progress: f64) -> &str {
        self.phases
            .iter()
            .find(|phase| progress < phase.below)
            .map(|phase| phase.label.as_str())
            .unwrap_or(&self.final_phase)
    }

    /// Merges elapsed time, the previously displayed value and the server value.
    ///
    /// The displayed value is `max(previous, heuristic, server)`, so it never
    /// decreases across calls even when the server under-reports.
    pub fn estimate(
        &self,
        elapsed: Duration,
        previous_displayed: f64,
        server_progress: f64,
    ) -> Estimate {
        let heuristic = self.heuristic(elapsed);
        let displayed = previous_displayed
            .max(heuristic)
            .max(server_progress)
            .clamp(0.0, 100.0);
        Estimate {
            heuristic,
            displayed,
            phase_label: self.phase_for(displayed).to_string(),
            remaining: self.assumed_total.saturating_sub(elapsed),
        }
    }
}

/// Formats a remaining duration as `"{m}m {s}s"`.
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}
