use std::time::Duration;

use monitor_core::{EstimatorConfig, HEURISTIC_CAP};
use proptest::prelude::*;

const EPSILON: f64 = 1e-9;

#[test]
fn first_running_poll_uses_time_heuristic() {
    let config = EstimatorConfig::default();
    let estimate = config.estimate(Duration::from_secs(30), 0.0, 10.0);

    assert!((estimate.heuristic - 12.5).abs() < EPSILON);
    assert!((estimate.displayed - 12.5).abs() < EPSILON);
    assert_eq!(estimate.phase_label, "Ingestion Agent: Analyzing documents...");
    assert_eq!(estimate.remaining, Duration::from_secs(210));
}

#[test]
fn ratchet_holds_when_server_regresses() {
    let config = EstimatorConfig::default();
    let estimate = config.estimate(Duration::from_secs(130), 12.5, 5.0);

    assert!((estimate.displayed - 54.1666).abs() < 1e-3);
    assert_eq!(estimate.phase_label, "Synthesis Agent: Structuring report...");
}

#[test]
fn server_progress_can_lead_the_heuristic() {
    let config = EstimatorConfig::default();
    let estimate = config.estimate(Duration::from_secs(10), 0.0, 85.0);

    assert_eq!(estimate.displayed, 85.0);
    assert_eq!(estimate.phase_label, "Compliance Agent: Finalizing report...");
}

#[test]
fn out_of_range_server_progress_is_clamped() {
    let config = EstimatorConfig::default();
    assert_eq!(config.estimate(Duration::ZERO, 0.0, 140.0).displayed, 100.0);
    assert_eq!(config.estimate(Duration::ZERO, 0.0, -3.0).displayed, 0.0);
}

#[test]
fn custom_breakpoints_are_honoured() {
    let mut config = EstimatorConfig::default().with_assumed_total(Duration::from_secs(10));
    config.phases = vec![monitor_core::PhaseBreakpoint::new(50.0, "first half")];
    config.final_phase = "second half".to_string();

    assert_eq!(config.estimate(Duration::from_secs(2), 0.0, 0.0).phase_label, "first half");
    assert_eq!(config.estimate(Duration::from_secs(6), 0.0, 0.0).phase_label, "second half");
}

proptest! {
    /// Property: the time heuristic stays within [0, cap] for any elapsed time.
    #[test]
    fn prop_heuristic_is_bounded(elapsed_ms in 0u64..10_000_000) {
        let config = EstimatorConfig::default();
        let heuristic = config.heuristic(Duration::from_millis(elapsed_ms));
        prop_assert!((0.0..=HEURISTIC_CAP).contains(&heuristic));
    }

    /// Property: the displayed value stays in [0, 100] whatever the inputs.
    #[test]
    fn prop_displayed_is_bounded(
        elapsed_ms in 0u64..10_000_000,
        previous in 0.0f64..100.0,
        server in -50.0f64..200.0,
    ) {
        let config = EstimatorConfig::default();
        let estimate = config.estimate(Duration::from_millis(elapsed_ms), previous, server);
        prop_assert!((0.0..=100.0).contains(&estimate.displayed));
    }

    /// Property: with non-decreasing elapsed time the displayed value never drops,
    /// even when the server value falls between calls.
    #[test]
    fn prop_displayed_never_decreases(
        first_ms in 0u64..500_000,
        step_ms in 0u64..500_000,
        first_server in 0.0f64..100.0,
        second_server in 0.0f64..100.0,
    ) {
        let config = EstimatorConfig::default();
        let first = config.estimate(Duration::from_millis(first_ms), 0.0, first_server);
        let second = config.estimate(
            Duration::from_millis(first_ms + step_ms),
            first.displayed,
            second_server,
        );
        prop_assert!(second.displayed >= first.displayed);
    }
}
