use monitor_core::Route;

/// Hands the user off to the next view once a job is finished.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, route: Route);
}

/// Prints the route the user should open next.
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate_to(&self, route: Route) {
        match route {
            Route::Report(report_id) => {
                println!("Report {report_id} is ready: {}", route.path());
            }
            Route::Dashboard => println!("Back to {}", route.path()),
        }
    }
}
