//! Bin statistics for a finished measurement window

use serde::Serialize;

/// Summary of one measurement window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementResult {
    pub duration_secs: f64,
    pub bin_width_secs: f64,
    pub total_events: usize,
    /// Events per second over the whole window
    pub average_rate: f64,
    /// Highest single-bin rate
    pub max_rate: f64,
    /// 0..=100, higher is steadier
    pub stability_score: f64,
    /// Per-bin rate, events per second
    pub bin_rates: Vec<f64>,
    /// Cumulative average rate at the end of each bin
    pub running_average: Vec<f64>,
}

impl MeasurementResult {
    /// Stability rounded for display
    pub fn stability_display(&self) -> u32 {
        self.stability_score.round() as u32
    }
}

/// Seconds to whole nanoseconds, so bin edges compare exactly
fn nanos(secs: f64) -> u64 {
    (secs * 1e9).round() as u64
}

/// Number of bins covering `duration`
pub fn bin_count(duration: f64, bin_width: f64) -> usize {
    let bin_ns = nanos(bin_width.max(0.0));
    if duration <= 0.0 || bin_ns == 0 {
        return 1;
    }
    (nanos(duration).div_ceil(bin_ns) as usize).max(1)
}

/// Count event offsets (seconds since window start) per bin
///
/// Offsets are clamped into the window, so out-of-range values land in the
/// first or last bin. An offset exactly on an edge belongs to the later bin.
pub fn bin_counts(offsets: &[f64], duration: f64, bin_width: f64) -> Vec<u32> {
    let n = bin_count(duration, bin_width);
    let mut bins = vec![0u32; n];
    let bin_ns = nanos(bin_width.max(0.0));
    if bin_ns == 0 {
        bins[0] = offsets.len() as u32;
        return bins;
    }
    for &t in offsets {
        let t = if t.is_finite() { t.max(0.0).min(duration) } else { 0.0 };
        let idx = ((nanos(t) / bin_ns) as usize).min(n - 1);
        bins[idx] += 1;
    }
    bins
}

/// Cumulative average rate after each bin
pub fn running_average(bins: &[u32], bin_width: f64) -> Vec<f64> {
    let mut total = 0u64;
    bins.iter()
        .enumerate()
        .map(|(i, count)| {
            total += *count as u64;
            total as f64 / ((i + 1) as f64 * bin_width)
        })
        .collect()
}

/// Steadiness of the per-bin rates
///
/// `100 - 160 * stddev / mean`, clamped to 0..=100, using the sample
/// standard deviation. Zero mean scores 0; a single bin has no spread.
pub fn stability_score(rates: &[f64]) -> f64 {
    if rates.is_empty() {
        return 0.0;
    }
    let n = rates.len() as f64;
    let mean = rates.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 0.0;
    }
    let std = if rates.len() > 1 {
        let var = rates.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        var.sqrt()
    } else {
        0.0
    };
    (100.0 - 160.0 * std / mean).clamp(0.0, 100.0)
}

/// Compute the full result for a set of event offsets
pub fn summarize(offsets: &[f64], duration: f64, bin_width: f64) -> MeasurementResult {
    let bins = bin_counts(offsets, duration, bin_width);
    let bin_rates: Vec<f64> = if bin_width > 0.0 {
        bins.iter().map(|c| *c as f64 / bin_width).collect()
    } else {
        vec![0.0; bins.len()]
    };
    let running_average = if bin_width > 0.0 {
        running_average(&bins, bin_width)
    } else {
        vec![0.0; bins.len()]
    };
    let total_events = offsets.len();
    let average_rate = if duration > 0.0 {
        total_events as f64 / duration
    } else {
        0.0
    };
    let max_rate = bin_rates.iter().copied().fold(0.0, f64::max);

    MeasurementResult {
        duration_secs: duration,
        bin_width_secs: bin_width,
        total_events,
        average_rate,
        max_rate,
        stability_score: stability_score(&bin_rates),
        bin_rates,
        running_average,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn ten_second_window_has_hundred_bins() {
        assert_eq!(bin_count(10.0, 0.1), 100);
        assert_eq!(bin_count(5.0, 0.1), 50);
        assert_eq!(bin_count(0.25, 0.1), 3);
        assert_eq!(bin_count(0.0, 0.1), 1);
    }

    #[test]
    fn steady_stream_scores_full_stability() {
        // one event every 100ms
        let offsets: Vec<f64> = (0..100).map(|i| i as f64 * 0.1 + 0.05).collect();
        let result = summarize(&offsets, 10.0, 0.1);
        assert_eq!(result.total_events, 100);
        assert!(approx(result.average_rate, 10.0));
        assert!(approx(result.max_rate, 10.0));
        assert!(approx(result.stability_score, 100.0));
        assert_eq!(result.stability_display(), 100);
        assert!(result.running_average.iter().all(|r| approx(*r, 10.0)));
    }

    #[test]
    fn empty_window_is_all_zero() {
        let result = summarize(&[], 10.0, 0.1);
        assert_eq!(result.total_events, 0);
        assert_eq!(result.average_rate, 0.0);
        assert_eq!(result.max_rate, 0.0);
        assert_eq!(result.stability_score, 0.0);
        assert_eq!(result.bin_rates.len(), 100);
        assert!(result.running_average.iter().all(|r| *r == 0.0));
    }

    #[test]
    fn offsets_are_clamped_into_window() {
        let bins = bin_counts(&[-1.0, 0.0, 10.0, 42.0], 10.0, 0.1);
        assert_eq!(bins[0], 2);
        assert_eq!(bins[99], 2);
        assert_eq!(bins.iter().sum::<u32>(), 4);
    }

    #[test]
    fn bursty_stream_scores_low() {
        // everything in the first second
        let offsets: Vec<f64> = (0..100).map(|i| i as f64 * 0.01).collect();
        let result = summarize(&offsets, 10.0, 0.1);
        assert!(approx(result.average_rate, 10.0));
        assert!(approx(result.max_rate, 100.0));
        assert_eq!(result.stability_score, 0.0);
    }

    #[test]
    fn edge_offsets_land_in_later_bin() {
        let bins = bin_counts(&[0.3, 0.7], 1.0, 0.1);
        assert_eq!(bins, vec![0, 0, 0, 1, 0, 0, 0, 1, 0, 0]);

        let offsets: Vec<f64> = (0..100).map(|i| i as f64 * 0.01).collect();
        let bins = bin_counts(&offsets, 10.0, 0.1);
        assert!(bins[..10].iter().all(|c| *c == 10), "{:?}", &bins[..10]);
        assert!(bins[10..].iter().all(|c| *c == 0));
    }

    #[test]
    fn running_average_accumulates() {
        let avg = running_average(&[2, 0, 1], 0.5);
        assert!(approx(avg[0], 4.0));
        assert!(approx(avg[1], 2.0));
        assert!(approx(avg[2], 2.0));
    }

    #[test]
    fn stability_uses_sample_deviation() {
        // mean 10, squared deviations sum to 4 over n-1 = 4 -> std 1
        let score = stability_score(&[9.0, 11.0, 9.0, 11.0, 10.0]);
        assert!(approx(score, 84.0), "{}", score);
        assert_eq!(stability_score(&[7.0]), 100.0);
        assert_eq!(stability_score(&[0.0, 0.0]), 0.0);
    }
}
