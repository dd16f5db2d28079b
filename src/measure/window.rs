//! Measurement window
//!
//! `Inactive -> Running -> Inactive`. The scheduler thread records events
//! while the UI thread ticks and reads; both go through one mutex.

use super::stats::{self, MeasurementResult};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Progress reported by [`RateTest::tick`]
#[derive(Debug, Clone, PartialEq)]
pub enum TestProgress {
    Inactive,
    Running {
        elapsed: f64,
        remaining: f64,
        /// Events so far divided by elapsed seconds
        live_rate: f64,
        events: usize,
    },
    /// The window expired on this tick
    Finished(MeasurementResult),
}

impl TestProgress {
    /// Fraction of the window elapsed, 0..=1
    pub fn fraction(&self, duration: f64) -> f64 {
        match self {
            Self::Inactive => 0.0,
            Self::Running { elapsed, .. } if duration > 0.0 => (elapsed / duration).clamp(0.0, 1.0),
            Self::Running { .. } => 0.0,
            Self::Finished(_) => 1.0,
        }
    }
}

#[derive(Debug)]
struct Window {
    duration: f64,
    bin_width: f64,
    started: Instant,
    events: Vec<f64>,
}

#[derive(Debug, Default)]
struct Inner {
    window: Option<Window>,
    last: Option<MeasurementResult>,
}

/// One measurement window at a time, plus the last finished result
#[derive(Debug, Default)]
pub struct RateTest {
    inner: Mutex<Inner>,
}

impl RateTest {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Open a window at `now`, discarding any running one
    pub fn start(&self, duration: Duration, bin_width: Duration, now: Instant) {
        let duration = duration.as_secs_f64();
        let bin_width = bin_width.as_secs_f64();
        let mut inner = self.lock();
        if inner.window.is_some() {
            log::info!("restarting rate test");
        }
        inner.window = Some(Window {
            duration,
            bin_width,
            started: now,
            events: Vec::new(),
        });
        log::info!("rate test started: {:.0}s, {:.0}ms bins", duration, bin_width * 1000.0);
    }

    pub fn is_running(&self) -> bool {
        self.lock().window.is_some()
    }

    /// Record one emission at `now`
    ///
    /// No-op when inactive. Events past the window end are dropped; the
    /// next tick closes the window.
    pub fn record(&self, now: Instant) {
        let mut inner = self.lock();
        if let Some(window) = inner.window.as_mut() {
            let offset = now.saturating_duration_since(window.started).as_secs_f64();
            if offset <= window.duration {
                window.events.push(offset);
            }
        }
    }

    /// Advance the window; closes it when `elapsed >= duration`
    pub fn tick(&self, now: Instant) -> TestProgress {
        let mut inner = self.lock();
        let Some(window) = inner.window.as_ref() else {
            return TestProgress::Inactive;
        };

        let elapsed = now.saturating_duration_since(window.started).as_secs_f64();
        if elapsed < window.duration {
            let live_rate = if elapsed > 0.0 {
                window.events.len() as f64 / elapsed
            } else {
                0.0
            };
            return TestProgress::Running {
                elapsed,
                remaining: window.duration - elapsed,
                live_rate,
                events: window.events.len(),
            };
        }

        let Some(window) = inner.window.take() else {
            return TestProgress::Inactive;
        };
        let result = stats::summarize(&window.events, window.duration, window.bin_width);
        log::info!(
            "rate test finished: {} events, avg {:.1}/s, max {:.1}/s, stability {}",
            result.total_events,
            result.average_rate,
            result.max_rate,
            result.stability_display()
        );
        inner.last = Some(result.clone());
        TestProgress::Finished(result)
    }

    /// Abandon the running window without a result; false if none was open
    pub fn cancel(&self) -> bool {
        let cancelled = self.lock().window.take().is_some();
        if cancelled {
            log::info!("rate test cancelled");
        }
        cancelled
    }

    pub fn last_result(&self) -> Option<MeasurementResult> {
        self.lock().last.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEN: Duration = Duration::from_secs(10);
    const BIN: Duration = Duration::from_millis(100);

    fn at(start: Instant, secs: f64) -> Instant {
        start + Duration::from_secs_f64(secs)
    }

    #[test]
    fn inactive_until_started() {
        let test = RateTest::new();
        assert!(!test.is_running());
        test.record(Instant::now());
        assert_eq!(test.tick(Instant::now()), TestProgress::Inactive);
        assert!(test.last_result().is_none());
    }

    #[test]
    fn live_rate_while_running() {
        let test = RateTest::new();
        let start = Instant::now();
        test.start(TEN, BIN, start);
        for i in 0..20 {
            test.record(at(start, i as f64 * 0.1));
        }
        match test.tick(at(start, 2.0)) {
            TestProgress::Running {
                elapsed,
                remaining,
                live_rate,
                events,
            } => {
                assert!((elapsed - 2.0).abs() < 1e-6);
                assert!((remaining - 8.0).abs() < 1e-6);
                assert!((live_rate - 10.0).abs() < 1e-6);
                assert_eq!(events, 20);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn expiry_produces_result_once() {
        let test = RateTest::new();
        let start = Instant::now();
        test.start(TEN, BIN, start);
        for i in 0..100 {
            test.record(at(start, i as f64 * 0.1 + 0.05));
        }
        let TestProgress::Finished(result) = test.tick(at(start, 10.0)) else {
            panic!("window should have closed");
        };
        assert_eq!(result.total_events, 100);
        assert!((result.average_rate - 10.0).abs() < 1e-6);
        assert!(!test.is_running());
        assert_eq!(test.tick(at(start, 10.1)), TestProgress::Inactive);
        assert_eq!(test.last_result(), Some(result));
    }

    #[test]
    fn late_events_are_dropped() {
        let test = RateTest::new();
        let start = Instant::now();
        test.start(Duration::from_secs(1), BIN, start);
        test.record(at(start, 0.5));
        test.record(at(start, 1.5));
        let TestProgress::Finished(result) = test.tick(at(start, 1.5)) else {
            panic!("window should have closed");
        };
        assert_eq!(result.total_events, 1);
    }

    #[test]
    fn restart_clears_events() {
        let test = RateTest::new();
        let start = Instant::now();
        test.start(TEN, BIN, start);
        test.record(at(start, 0.5));
        test.start(TEN, BIN, at(start, 1.0));
        assert!(matches!(
            test.tick(at(start, 1.5)),
            TestProgress::Running { events: 0, .. }
        ));
    }

    #[test]
    fn cancel_keeps_previous_result() {
        let test = RateTest::new();
        let start = Instant::now();
        test.start(Duration::from_secs(1), BIN, start);
        test.tick(at(start, 1.0));
        assert!(test.last_result().is_some());
        test.start(TEN, BIN, at(start, 2.0));
        assert!(test.cancel());
        assert!(!test.cancel());
        assert!(!test.is_running());
        assert!(test.last_result().is_some());
    }

    #[test]
    fn progress_fraction() {
        let running = TestProgress::Running {
            elapsed: 2.5,
            remaining: 7.5,
            live_rate: 0.0,
            events: 0,
        };
        assert!((running.fraction(10.0) - 0.25).abs() < 1e-9);
        assert_eq!(TestProgress::Inactive.fraction(10.0), 0.0);
    }
}
