use indicatif::{ProgressBar, ProgressStyle};
use monitor_core::{JobId, MonitorViewModel, TaskStep};

/// Bar length; one unit is a tenth of a percent.
const BAR_SCALE: u64 = 1_000;
const BAR_TEMPLATE: &str = "{prefix:.bold} [{wide_bar:.cyan/blue}] {msg}";

pub struct ProgressRenderer {
    bar: ProgressBar,
    last_notice: Option<String>,
    last_tasks: Vec<TaskStep>,
}

impl ProgressRenderer {
    pub fn new(job_id: JobId) -> Self {
        let bar = ProgressBar::new(BAR_SCALE);
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        bar.set_prefix(format!("job {job_id}"));
        Self {
            bar,
            last_notice: None,
            last_tasks: Vec::new(),
        }
    }

    pub fn render(&mut self, view: &MonitorViewModel) {
        self.bar.set_position(bar_position(view.displayed_progress));
        self.bar.set_message(status_line(view));
        if view.cancel_error != self.last_notice {
            if let Some(notice) = &view.cancel_error {
                self.bar.println(format!("! {notice}"));
            }
            self.last_notice = view.cancel_error.clone();
        }
        for task in changed_tasks(&self.last_tasks, &view.tasks) {
            self.bar.println(task_line(task));
        }
        if view.tasks != self.last_tasks {
            self.last_tasks = view.tasks.clone();
        }
    }

    /// Leaves the final state on screen.
    pub fn finish(&self) {
        self.bar.finish();
    }

    pub fn fail(&self, error: &str) {
        self.bar.abandon_with_message(format!("error: {error}"));
    }

    pub fn abandon(&self) {
        self.bar.abandon_with_message("stopped watching");
    }

    pub fn notice(&self, line: &str) {
        self.bar.println(line);
    }

    /// Handle for printing above the bar from other tasks.
    pub fn printer(&self) -> ProgressBar {
        self.bar.clone()
    }
}

fn bar_position(progress: f64) -> u64 {
    (progress.clamp(0.0, 100.0) * 10.0).round() as u64
}

pub(crate) fn status_line(view: &MonitorViewModel) -> String {
    if view.loading {
        return "Loading job...".to_string();
    }
    let mut line = format!("{:5.1}% | {}", view.displayed_progress, view.phase_label);
    if !view.terminal {
        line.push_str(&format!(" | {} left", view.remaining_label));
    }
    if view.cancel_in_flight {
        line.push_str(" | cancelling...");
    }
    line
}

/// Steps that are new or whose status moved since the previous render.
fn changed_tasks<'a>(previous: &[TaskStep], current: &'a [TaskStep]) -> Vec<&'a TaskStep> {
    current
        .iter()
        .filter(|task| {
            !previous
                .iter()
                .any(|seen| seen.step == task.step && seen.status == task.status)
        })
        .collect()
}

fn task_line(task: &TaskStep) -> String {
    let mut line = format!("  {}: {}", task.step, task.status);
    if task.progress > 0.0 && task.progress < 100.0 {
        line.push_str(&format!(" ({:.0}%)", task.progress));
    }
    if let Some(error) = &task.error {
        line.push_str(&format!(" ({error})"));
    }
    line
}
