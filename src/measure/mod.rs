//! Rate measurement ("CPS test")
//!
//! Times every successful emission during a bounded window, bins the
//! timestamps and reports average, peak and stability.

pub mod stats;
pub mod window;

pub use stats::MeasurementResult;
pub use window::{RateTest, TestProgress};

/// Selectable window lengths, seconds
pub const DURATIONS: [u64; 3] = [5, 10, 15];

/// A single result row for display
#[derive(Debug, Clone)]
pub struct TestResult {
    pub label: String,
    pub value: String,
    pub status: ResultStatus,
}

impl TestResult {
    pub fn new(label: impl Into<String>, value: impl Into<String>, status: ResultStatus) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            status,
        }
    }

    pub fn ok(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, value, ResultStatus::Ok)
    }

    pub fn warning(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, value, ResultStatus::Warning)
    }

    pub fn error(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, value, ResultStatus::Error)
    }

    pub fn info(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, value, ResultStatus::Info)
    }
}

/// Status of a result row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Ok,
    Warning,
    Error,
    Info,
}

/// Next entry in [`DURATIONS`] after `current`
pub fn next_duration(current: u64) -> u64 {
    DURATIONS
        .iter()
        .copied()
        .find(|d| *d > current)
        .unwrap_or(DURATIONS[0])
}

/// Rows for a finished measurement
pub fn result_rows(result: &MeasurementResult, target_rate: u32) -> Vec<TestResult> {
    let stability = result.stability_display();
    let stability_row = match stability {
        80.. => TestResult::ok("Stability", format!("{}/100", stability)),
        50..=79 => TestResult::warning("Stability", format!("{}/100", stability)),
        _ => TestResult::error("Stability", format!("{}/100", stability)),
    };

    // Within 10% of the target counts as on pace
    let target = target_rate as f64;
    let avg_row = if target > 0.0 && (result.average_rate - target).abs() <= target * 0.1 {
        TestResult::ok("Average", format!("{:.1}/s", result.average_rate))
    } else {
        TestResult::warning("Average", format!("{:.1}/s", result.average_rate))
    };

    vec![
        TestResult::info("Window", format!("{:.0}s", result.duration_secs)),
        TestResult::info("Events", result.total_events.to_string()),
        avg_row,
        TestResult::info("Peak", format!("{:.1}/s", result.max_rate)),
        stability_row,
        TestResult::info("Target", format!("{}/s", target_rate)),
    ]
}

/// Rows for a window still in progress
pub fn progress_rows(progress: &TestProgress) -> Vec<TestResult> {
    match progress {
        TestProgress::Inactive => vec![TestResult::info("Rate test", "press 't' to start")],
        TestProgress::Running {
            remaining,
            live_rate,
            events,
            ..
        } => vec![
            TestResult::info("Remaining", format!("{:.1}s", remaining)),
            TestResult::info("Events", events.to_string()),
            TestResult::info("Live rate", format!("{:.1}/s", live_rate)),
        ],
        TestProgress::Finished(result) => vec![TestResult::ok(
            "Finished",
            format!("{} events", result.total_events),
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady() -> MeasurementResult {
        let offsets: Vec<f64> = (0..100).map(|i| i as f64 * 0.1 + 0.05).collect();
        stats::summarize(&offsets, 10.0, 0.1)
    }

    #[test]
    fn durations_cycle() {
        assert_eq!(next_duration(5), 10);
        assert_eq!(next_duration(10), 15);
        assert_eq!(next_duration(15), 5);
        assert_eq!(next_duration(7), 10);
    }

    #[test]
    fn steady_result_rows_are_ok() {
        let rows = result_rows(&steady(), 10);
        let stability = rows.iter().find(|r| r.label == "Stability").unwrap();
        assert_eq!(stability.status, ResultStatus::Ok);
        assert_eq!(stability.value, "100/100");
        let avg = rows.iter().find(|r| r.label == "Average").unwrap();
        assert_eq!(avg.status, ResultStatus::Ok);
    }

    #[test]
    fn off_pace_average_warns() {
        let rows = result_rows(&steady(), 100);
        let avg = rows.iter().find(|r| r.label == "Average").unwrap();
        assert_eq!(avg.status, ResultStatus::Warning);
    }

    #[test]
    fn empty_result_is_an_error_row() {
        let result = stats::summarize(&[], 5.0, 0.1);
        let rows = result_rows(&result, 100);
        let stability = rows.iter().find(|r| r.label == "Stability").unwrap();
        assert_eq!(stability.status, ResultStatus::Error);
    }

    #[test]
    fn progress_rows_show_remaining() {
        let rows = progress_rows(&TestProgress::Running {
            elapsed: 1.0,
            remaining: 4.0,
            live_rate: 12.0,
            events: 12,
        });
        assert_eq!(rows[0].value, "4.0s");
        assert_eq!(rows[2].value, "12.0/s");
    }
}
