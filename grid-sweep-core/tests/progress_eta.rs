use std::time::Duration;

use grid_sweep_core::progress::ProgressState;

#[test]
fn test_fresh_state_reports_zero_averages_and_eta() {
    let state = ProgressState::new(10);

    assert_eq!(state.average_generation_time(), Duration::ZERO);
    assert_eq!(state.average_processing_time(), Duration::ZERO);
    assert_eq!(state.eta(), Duration::ZERO);
    assert_eq!(state.percent(), 0);
}

#[test]
fn test_job_without_saved_images_produces_no_report() {
    let mut state = ProgressState::new(6);
    let report = state.record(0, Duration::from_secs(4), Duration::ZERO);

    assert!(report.is_none());
    assert_eq!(state.images_done(), 0);
    assert_eq!(state.eta(), Duration::ZERO);
}

#[test]
fn test_eta_uses_average_generation_plus_processing_per_image() {
    let mut state = ProgressState::new(6);
    let report = state
        .record(3, Duration::from_secs(30), Duration::from_secs(3))
        .expect("saved images produce a report");

    // (10s + 1s) per image x 3 remaining
    assert_eq!(report.eta, Duration::from_secs(33));
    assert_eq!(report.percent, 50);
    assert_eq!(
        report.to_string(),
        "3/6 images done (50%), estimated time left: 0:0:33"
    );
}

#[test]
fn test_percent_truncates() {
    let mut state = ProgressState::new(3);
    let report = state.record(2, Duration::ZERO, Duration::ZERO).unwrap();
    assert_eq!(report.percent, 66);
}

#[test]
fn test_eta_formats_hours_minutes_seconds() {
    let mut state = ProgressState::new(101);
    let report = state
        .record(1, Duration::from_secs_f64(37.259), Duration::ZERO)
        .unwrap();

    // 37.259s x 100 = 3725.9s -> 1:2:5
    assert_eq!(report.eta.as_secs(), 3725);
    assert!(report.to_string().ends_with("estimated time left: 1:2:5"));
}

#[test]
fn test_eta_is_non_increasing_with_constant_per_image_cost() {
    let mut state = ProgressState::new(20);
    let mut previous = None;
    for _ in 0..10 {
        let report = state
            .record(2, Duration::from_secs(10), Duration::from_secs(2))
            .unwrap();
        if let Some(prev) = previous {
            assert!(report.eta <= prev, "{:?} > {:?}", report.eta, prev);
        }
        previous = Some(report.eta);
    }
    assert_eq!(previous, Some(Duration::ZERO));
    assert_eq!(state.percent(), 100);
}

#[test]
fn test_zero_total_reports_zero_percent() {
    let mut state = ProgressState::new(0);
    let report = state.record(1, Duration::from_secs(1), Duration::ZERO).unwrap();
    assert_eq!(report.percent, 0);
    assert_eq!(report.eta, Duration::ZERO);
}
