use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::RecoveryError;
use crate::monte_carlo::simulation::SimulationSample;
use crate::RecoveryResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Decision-relevant figures derived from a simulated recovery distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecoveryStatistics {
    pub mean: f64,
    /// Population standard deviation (divides by the trial count).
    pub std_dev: f64,
    /// Pessimistic scenario: 95% of trials recovered at least this much.
    pub p5: f64,
    /// Optimistic scenario: only 5% of trials recovered more.
    pub p95: f64,
    pub minus_one_sigma: f64,
    pub plus_one_sigma: f64,
    pub minus_two_sigma: f64,
    pub plus_two_sigma: f64,
}

/// Summary of one simulation run. Keeps the sample for downstream histograms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub trial_count: u32,
    pub sample: SimulationSample,
    #[serde(flatten)]
    pub statistics: RecoveryStatistics,
}

/// Which point of the distribution to price against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// 5th percentile.
    Pessimistic,
    /// Arithmetic mean.
    #[default]
    Mean,
    /// 95th percentile.
    Optimistic,
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scenario::Pessimistic => write!(f, "Pessimistic (P5)"),
            Scenario::Mean => write!(f, "Mean"),
            Scenario::Optimistic => write!(f, "Optimistic (P95)"),
        }
    }
}

impl RecoveryStatistics {
    pub fn scenario_value(&self, scenario: Scenario) -> f64 {
        match scenario {
            Scenario::Pessimistic => self.p5,
            Scenario::Mean => self.mean,
            Scenario::Optimistic => self.p95,
        }
    }
}

/// A single histogram bin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u32,
    pub frequency: f64,
}

// ---------------------------------------------------------------------------
// Statistics helpers
// ---------------------------------------------------------------------------

/// Percentile of a **sorted** slice using linear interpolation between closest ranks.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        let (a, b) = (sorted[lower], sorted[upper]);
        // rounding must not step outside the bracketing pair
        (a + (b - a) * frac).clamp(a, b)
    }
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

fn validate_trial_count(sample: &SimulationSample, trial_count: u32) -> RecoveryResult<()> {
    if sample.len() != trial_count as usize {
        return Err(RecoveryError::invalid(
            "trial_count",
            format!(
                "Sample holds {} trials but trial_count is {trial_count}",
                sample.len()
            ),
        ));
    }
    Ok(())
}

fn validate_values(values: &[f64]) -> RecoveryResult<()> {
    if values.is_empty() {
        return Err(RecoveryError::invalid(
            "sample",
            "Sample must contain at least one trial",
        ));
    }
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(RecoveryError::invalid(
            "sample",
            format!("Trial {i} is not a finite number"),
        ));
    }
    Ok(())
}

/// Percentile `p` (0..=100) of an unsorted sample.
pub fn percentile(values: &[f64], p: f64) -> RecoveryResult<f64> {
    validate_values(values)?;
    if !(0.0..=100.0).contains(&p) {
        return Err(RecoveryError::invalid(
            "percentile",
            format!("Must be within [0, 100], got {p}"),
        ));
    }
    Ok(percentile_sorted(&sorted_copy(values), p))
}

/// Describe a sample without taking ownership of it.
pub fn describe(values: &[f64]) -> RecoveryResult<RecoveryStatistics> {
    validate_values(values)?;
    Ok(describe_sorted(values, &sorted_copy(values)))
}

/// Statistics of `values`, with `sorted` the same values in ascending order.
fn describe_sorted(values: &[f64], sorted: &[f64]) -> RecoveryStatistics {
    // Running mean is exact for constant samples, so a zero-variance sample
    // reports p5 == p95 == mean.
    let mean = values.iter().mean();
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let std_dev = variance.sqrt();

    RecoveryStatistics {
        mean,
        std_dev,
        p5: percentile_sorted(sorted, 5.0),
        p95: percentile_sorted(sorted, 95.0),
        minus_one_sigma: mean - std_dev,
        plus_one_sigma: mean + std_dev,
        minus_two_sigma: mean - 2.0 * std_dev,
        plus_two_sigma: mean + 2.0 * std_dev,
    }
}

/// Equal-width bins over a non-empty ascending slice.
///
/// Bin `i` covers `[lower, upper)`; the last bin also takes the maximum.
fn histogram_sorted(sorted: &[f64], num_bins: usize) -> Vec<HistogramBin> {
    let n = sorted.len();
    let (lo, hi) = (sorted[0], sorted[n - 1]);
    if lo == hi {
        return vec![HistogramBin {
            lower: lo,
            upper: hi,
            count: n as u32,
            frequency: 1.0,
        }];
    }

    let width = (hi - lo) / num_bins as f64;
    let mut rest = sorted;
    (0..num_bins)
        .map(|i| {
            let last = i + 1 == num_bins;
            let lower = lo + i as f64 * width;
            let upper = if last { hi } else { lo + (i + 1) as f64 * width };
            let taken = if last {
                rest.len()
            } else {
                rest.partition_point(|&v| v < upper)
            };
            rest = &rest[taken..];
            HistogramBin {
                lower,
                upper,
                count: taken as u32,
                frequency: taken as f64 / n as f64,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Reduce a simulated sample to its summary record.
///
/// `trial_count` labels the run and must match the sample length.
pub fn summarize(sample: SimulationSample, trial_count: u32) -> RecoveryResult<SummaryResult> {
    validate_trial_count(&sample, trial_count)?;
    let statistics = describe(sample.as_slice())?;
    Ok(SummaryResult {
        trial_count,
        sample,
        statistics,
    })
}

/// Build a histogram with `num_bins` equal-width bins.
pub fn build_histogram(values: &[f64], num_bins: usize) -> RecoveryResult<Vec<HistogramBin>> {
    validate_values(values)?;
    validate_bins(num_bins)?;
    Ok(histogram_sorted(&sorted_copy(values), num_bins))
}

/// [`summarize`] and [`build_histogram`] over one sort of the sample.
pub fn summarize_with_histogram(
    sample: SimulationSample,
    trial_count: u32,
    num_bins: usize,
) -> RecoveryResult<(SummaryResult, Vec<HistogramBin>)> {
    validate_trial_count(&sample, trial_count)?;
    validate_values(sample.as_slice())?;
    validate_bins(num_bins)?;

    let sorted = sorted_copy(sample.as_slice());
    let statistics = describe_sorted(sample.as_slice(), &sorted);
    let histogram = histogram_sorted(&sorted, num_bins);
    Ok((
        SummaryResult {
            trial_count,
            sample,
            statistics,
        },
        histogram,
    ))
}

fn validate_bins(num_bins: usize) -> RecoveryResult<()> {
    if num_bins == 0 {
        return Err(RecoveryError::invalid("histogram_bins", "Must be at least 1"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(values: &[f64]) -> SimulationSample {
        SimulationSample::from(values.to_vec())
    }

    #[test]
    fn test_single_trial_collapses() {
        let s = summarize(sample(&[1234.5]), 1).unwrap();
        let st = s.statistics;
        assert_eq!(st.std_dev, 0.0);
        assert_eq!(st.mean, 1234.5);
        assert_eq!(st.p5, 1234.5);
        assert_eq!(st.p95, 1234.5);
        assert_eq!(st.minus_two_sigma, st.plus_two_sigma);
    }

    #[test]
    fn test_zero_variance_is_not_an_error() {
        let s = summarize(sample(&[50.0; 10]), 10).unwrap();
        assert_eq!(s.statistics.std_dev, 0.0);
        assert_eq!(s.statistics.p5, 50.0);
        assert_eq!(s.statistics.p95, 50.0);
        assert_eq!(s.statistics.mean, 50.0);
    }

    #[test]
    fn test_population_std_dev() {
        // mean 5, population variance 4
        let s = summarize(sample(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 8).unwrap();
        assert!((s.statistics.mean - 5.0).abs() < 1e-12);
        assert!((s.statistics.std_dev - 2.0).abs() < 1e-12);
        assert!((s.statistics.plus_one_sigma - 7.0).abs() < 1e-12);
        assert!((s.statistics.minus_two_sigma - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_interpolation_percentiles() {
        // 0..=10: rank for p5 = 0.5, for p95 = 9.5
        let values: Vec<f64> = (0..=10).map(|v| v as f64).collect();
        let s = summarize(sample(&values), 11).unwrap();
        assert!((s.statistics.p5 - 0.5).abs() < 1e-12);
        assert!((s.statistics.p95 - 9.5).abs() < 1e-12);
    }

    #[test]
    fn test_percentiles_ignore_trial_order() {
        let a = summarize(sample(&[3.0, 1.0, 2.0, 5.0, 4.0]), 5).unwrap();
        let b = summarize(sample(&[1.0, 2.0, 3.0, 4.0, 5.0]), 5).unwrap();
        assert_eq!(a.statistics.p5, b.statistics.p5);
        assert_eq!(a.statistics.p95, b.statistics.p95);
        // the retained sample keeps trial order
        assert_eq!(a.sample.as_slice(), &[3.0, 1.0, 2.0, 5.0, 4.0]);
    }

    #[test]
    fn test_empty_sample_rejected() {
        let err = summarize(sample(&[]), 0).unwrap_err();
        assert!(matches!(err, RecoveryError::InvalidInput { .. }));
    }

    #[test]
    fn test_trial_count_mismatch_rejected() {
        assert!(summarize(sample(&[1.0, 2.0]), 3).is_err());
    }

    #[test]
    fn test_non_finite_sample_rejected() {
        assert!(summarize(sample(&[1.0, f64::NAN]), 2).is_err());
    }

    #[test]
    fn test_scenario_value_mapping() {
        let s = summarize(sample(&[0.0, 10.0, 20.0, 30.0, 40.0]), 5).unwrap();
        let st = s.statistics;
        assert_eq!(st.scenario_value(Scenario::Mean), 20.0);
        assert_eq!(st.scenario_value(Scenario::Pessimistic), st.p5);
        assert_eq!(st.scenario_value(Scenario::Optimistic), st.p95);
    }

    #[test]
    fn test_percentile_bounds_checked() {
        assert!(percentile(&[1.0, 2.0], 101.0).is_err());
        assert_eq!(percentile(&[4.0, 1.0, 3.0, 2.0], 100.0).unwrap(), 4.0);
        assert_eq!(percentile(&[4.0, 1.0, 3.0, 2.0], 0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_histogram_counts_and_frequencies() {
        let values: Vec<f64> = (0..1000).map(|v| v as f64).collect();
        let h = build_histogram(&values, 20).unwrap();
        assert_eq!(h.len(), 20);
        let total: u32 = h.iter().map(|b| b.count).sum();
        assert_eq!(total, 1000);
        let freq: f64 = h.iter().map(|b| b.frequency).sum();
        assert!((freq - 1.0).abs() < 1e-10);
        assert_eq!(h[19].upper, 999.0);
    }

    #[test]
    fn test_histogram_single_value() {
        let h = build_histogram(&[7.0, 7.0, 7.0], 20).unwrap();
        assert_eq!(h.len(), 1);
        assert_eq!(h[0].count, 3);
    }

    #[test]
    fn test_histogram_edges_left_closed() {
        let h = build_histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], 2).unwrap();
        assert_eq!(h[0].upper, 2.0);
        assert_eq!(h[0].count, 2);
        assert_eq!(h[1].count, 3);
    }

    #[test]
    fn test_combined_summary_matches_separate_calls() {
        let values = vec![5.0, 1.0, 9.0, 3.0, 3.0, 7.0, 2.0];
        let (summary, histogram) = summarize_with_histogram(sample(&values), 7, 3).unwrap();
        assert_eq!(summary.statistics, describe(&values).unwrap());
        let separate = build_histogram(&values, 3).unwrap();
        let counts: Vec<u32> = histogram.iter().map(|b| b.count).collect();
        assert_eq!(counts, separate.iter().map(|b| b.count).collect::<Vec<_>>());
        assert_eq!(summary.sample.as_slice(), values.as_slice());
    }

    #[test]
    fn test_combined_summary_validates_first() {
        assert!(summarize_with_histogram(sample(&[1.0]), 2, 3).is_err());
        assert!(summarize_with_histogram(sample(&[1.0]), 1, 0).is_err());
    }

    #[test]
    fn test_histogram_zero_bins_rejected() {
        assert!(build_histogram(&[1.0, 2.0], 0).is_err());
    }

    #[test]
    fn test_scenario_serde_snake_case() {
        let s: Scenario = serde_json::from_str("\"pessimistic\"").unwrap();
        assert_eq!(s, Scenario::Pessimistic);
        assert_eq!(serde_json::to_string(&Scenario::Optimistic).unwrap(), "\"optimistic\"");
    }
}
