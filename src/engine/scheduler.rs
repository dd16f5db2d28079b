//! Emission scheduler
//!
//! One long-lived thread. While the run flag is set it injects the output
//! binding, reports the result to the engine and sleeps for the next
//! (optionally humanized) delay. While the flag is clear it idles in
//! fixed short sleeps. Clearing the flag is the only way to stop a
//! cadence; it takes effect at the next iteration.

use super::Engine;
use crate::input::{open_injector, Injector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Sleep between run-flag checks while idle
pub const IDLE_POLL: Duration = Duration::from_millis(50);

/// Floor for any computed delay
pub const MIN_DELAY: Duration = Duration::from_millis(1);

/// Rate used when the configured one is missing or invalid
pub const DEFAULT_RATE: u32 = 100;

/// Upper bound for the jitter fraction
pub const MAX_JITTER: f64 = 0.30;

/// Chance of a micro-pause per emission
pub const MICRO_PAUSE_CHANCE: f64 = 0.02;

/// Range of a micro-pause, in seconds
pub const MICRO_PAUSE_SECS: (f64, f64) = (0.05, 0.14);

/// Suggested rates offered by the front end
pub const SUGGESTED_RATES: [u32; 9] = [10, 20, 50, 100, 150, 200, 300, 500, 1000];

/// Parse free-entry rate text, falling back to [`DEFAULT_RATE`]
pub fn parse_rate(text: &str) -> u32 {
    match text.trim().parse::<u32>() {
        Ok(rate) if rate > 0 => rate,
        _ => {
            log::warn!("invalid rate {:?}, using {}", text, DEFAULT_RATE);
            DEFAULT_RATE
        }
    }
}

/// Delay randomization settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Humanize {
    /// Master switch for jitter and micro-pauses
    pub enabled: bool,
    /// Jitter fraction in [0, 0.30]
    pub jitter: f64,
    /// Occasional longer pauses (needs `enabled`)
    pub micro_pause: bool,
}

impl Default for Humanize {
    fn default() -> Self {
        Self {
            enabled: false,
            jitter: 0.12,
            micro_pause: true,
        }
    }
}

impl Humanize {
    /// Clamp the jitter fraction into range; NaN becomes 0
    pub fn sanitized(mut self) -> Self {
        self.jitter = if self.jitter.is_finite() {
            self.jitter.clamp(0.0, MAX_JITTER)
        } else {
            0.0
        };
        self
    }
}

/// Target rate plus humanization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cadence {
    rate: u32,
    pub humanize: Humanize,
}

impl Cadence {
    pub fn new(rate: u32, humanize: Humanize) -> Self {
        let rate = if rate == 0 {
            log::warn!("rate must be positive, using {}", DEFAULT_RATE);
            DEFAULT_RATE
        } else {
            rate
        };
        Self {
            rate,
            humanize: humanize.sanitized(),
        }
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Un-humanized delay between emissions
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.rate as f64)
    }

    /// Next rate up in [`SUGGESTED_RATES`]
    pub fn step_up(&self) -> u32 {
        SUGGESTED_RATES
            .iter()
            .copied()
            .find(|r| *r > self.rate)
            .unwrap_or(self.rate)
    }

    /// Next rate down in [`SUGGESTED_RATES`]
    pub fn step_down(&self) -> u32 {
        SUGGESTED_RATES
            .iter()
            .rev()
            .copied()
            .find(|r| *r < self.rate)
            .unwrap_or(self.rate)
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self::new(DEFAULT_RATE, Humanize::default())
    }
}

/// Computes inter-emission delays
pub struct DelayPlanner<R = StdRng> {
    rng: R,
}

impl DelayPlanner<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic planner for tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> DelayPlanner<R> {
    /// Delay before the next emission
    pub fn next_delay(&mut self, cadence: &Cadence) -> Duration {
        let mut secs = 1.0 / cadence.rate() as f64;
        let humanize = cadence.humanize;

        if humanize.enabled && humanize.jitter > 0.0 {
            let factor = 1.0 + self.rng.gen_range(-humanize.jitter..=humanize.jitter);
            secs *= factor;
        }

        if humanize.enabled && humanize.micro_pause && self.rng.gen_bool(MICRO_PAUSE_CHANCE) {
            let (lo, hi) = MICRO_PAUSE_SECS;
            secs += self.rng.gen_range(lo..=hi);
        }

        Duration::from_secs_f64(secs).max(MIN_DELAY)
    }
}

/// The emission loop
pub struct Scheduler {
    engine: Arc<Engine>,
    injector: Box<dyn Injector>,
    planner: DelayPlanner,
}

impl Scheduler {
    pub fn new(engine: Arc<Engine>, injector: Box<dyn Injector>, planner: DelayPlanner) -> Self {
        Self {
            engine,
            injector,
            planner,
        }
    }

    /// Spawn the loop with the platform injector
    pub fn spawn(engine: Arc<Engine>, shutdown: Arc<AtomicBool>) -> io::Result<JoinHandle<()>> {
        Self::spawn_with(engine, shutdown, open_injector)
    }

    /// Spawn the loop; `make_injector` runs on the scheduler thread
    pub fn spawn_with<F>(
        engine: Arc<Engine>,
        shutdown: Arc<AtomicBool>,
        make_injector: F,
    ) -> io::Result<JoinHandle<()>>
    where
        F: FnOnce() -> Box<dyn Injector> + Send + 'static,
    {
        thread::Builder::new()
            .name("emission-scheduler".to_string())
            .spawn(move || {
                let scheduler =
                    Scheduler::new(engine, make_injector(), DelayPlanner::from_entropy());
                scheduler.run(&shutdown);
            })
    }

    /// One iteration; returns how long to sleep before the next
    pub fn step(&mut self) -> Duration {
        let Some((output, cadence)) = self.engine.emission_plan() else {
            return IDLE_POLL;
        };

        match self.injector.emit(&output) {
            Ok(()) => {
                self.engine.emission_succeeded(Instant::now());
                self.planner.next_delay(&cadence)
            }
            Err(e) => {
                // run flag is already cleared; go straight back to polling
                self.engine.emission_failed(&e);
                IDLE_POLL
            }
        }
    }

    /// Loop until `shutdown` is set
    pub fn run(mut self, shutdown: &AtomicBool) {
        log::debug!("emission scheduler started");
        while !shutdown.load(Ordering::Acquire) {
            let delay = self.step();
            thread::sleep(delay);
        }
        log::debug!("emission scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn humanized(jitter: f64, micro_pause: bool) -> Cadence {
        Cadence::new(
            100,
            Humanize {
                enabled: true,
                jitter,
                micro_pause,
            },
        )
    }

    #[test]
    fn plain_delay_is_exact_reciprocal() {
        let mut planner = DelayPlanner::seeded(7);
        for rate in [1, 7, 100, 333, 1000] {
            let cadence = Cadence::new(rate, Humanize::default());
            for _ in 0..50 {
                assert_eq!(
                    planner.next_delay(&cadence),
                    Duration::from_secs_f64(1.0 / rate as f64)
                );
            }
        }
    }

    #[test]
    fn disabled_humanize_ignores_jitter_settings() {
        let mut planner = DelayPlanner::seeded(1);
        let cadence = Cadence::new(
            50,
            Humanize {
                enabled: false,
                jitter: 0.3,
                micro_pause: true,
            },
        );
        for _ in 0..200 {
            assert_eq!(planner.next_delay(&cadence), Duration::from_millis(20));
        }
    }

    #[test]
    fn jitter_stays_within_fraction() {
        let mut planner = DelayPlanner::seeded(42);
        let cadence = humanized(0.2, false);
        let mut saw_short = false;
        let mut saw_long = false;
        for _ in 0..2000 {
            let d = planner.next_delay(&cadence).as_secs_f64();
            assert!(d >= 0.008 - 1e-9 && d <= 0.012 + 1e-9, "delay {}", d);
            saw_short |= d < 0.0095;
            saw_long |= d > 0.0105;
        }
        assert!(saw_short && saw_long);
    }

    #[test]
    fn micro_pauses_are_rare_and_bounded() {
        let mut planner = DelayPlanner::seeded(3);
        let cadence = humanized(0.0, true);
        let mut pauses = 0;
        for _ in 0..10_000 {
            let d = planner.next_delay(&cadence).as_secs_f64();
            if d > 0.011 {
                pauses += 1;
                assert!(d >= 0.06 - 1e-9 && d <= 0.15 + 1e-9, "pause {}", d);
            }
        }
        // 2% of 10k, loosely
        assert!(pauses > 100 && pauses < 350, "pauses {}", pauses);
    }

    #[test]
    fn delay_never_below_floor() {
        let mut planner = DelayPlanner::seeded(9);
        let cadence = Cadence::new(1_000_000, Humanize::default());
        assert_eq!(planner.next_delay(&cadence), MIN_DELAY);
    }

    #[test]
    fn jitter_is_clamped() {
        let cadence = humanized(0.9, false);
        assert_eq!(cadence.humanize.jitter, MAX_JITTER);
        let cadence = humanized(-1.0, false);
        assert_eq!(cadence.humanize.jitter, 0.0);
        let cadence = humanized(f64::NAN, false);
        assert_eq!(cadence.humanize.jitter, 0.0);
    }

    #[test]
    fn zero_rate_uses_default() {
        assert_eq!(Cadence::new(0, Humanize::default()).rate(), DEFAULT_RATE);
    }

    #[test]
    fn parse_rate_falls_back() {
        assert_eq!(parse_rate("250"), 250);
        assert_eq!(parse_rate(" 12 "), 12);
        assert_eq!(parse_rate("0"), DEFAULT_RATE);
        assert_eq!(parse_rate("-5"), DEFAULT_RATE);
        assert_eq!(parse_rate("fast"), DEFAULT_RATE);
        assert_eq!(parse_rate(""), DEFAULT_RATE);
    }

    #[test]
    fn rate_steps_through_suggestions() {
        let cadence = Cadence::new(100, Humanize::default());
        assert_eq!(cadence.step_up(), 150);
        assert_eq!(cadence.step_down(), 50);
        let cadence = Cadence::new(120, Humanize::default());
        assert_eq!(cadence.step_up(), 150);
        assert_eq!(cadence.step_down(), 100);
        let cadence = Cadence::new(1000, Humanize::default());
        assert_eq!(cadence.step_up(), 1000);
    }
}
