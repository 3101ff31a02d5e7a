use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::RecoveryError;
use crate::monte_carlo::rng::{rng_from_seed, SeedHierarchy};
use crate::monte_carlo::statistics::{summarize_with_histogram, HistogramBin, SummaryResult};
use crate::portfolio::Portfolio;
use crate::types::{with_metadata, ComputationOutput, Precision};
use crate::RecoveryResult;

/// Trials per independently seeded block in [`simulate_partitioned`].
pub const TRIAL_BLOCK_SIZE: u32 = 1_024;

/// Progress is logged every this many trials.
const PROGRESS_INTERVAL: u32 = 1_000;

/// Below this many trials the tail percentiles are noisy.
const LOW_TRIAL_WARNING: u32 = 1_000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Total recovered value of each trial, in trial order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimulationSample {
    values: Vec<f64>,
}

impl SimulationSample {
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.values.iter()
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}

impl From<Vec<f64>> for SimulationSample {
    fn from(values: Vec<f64>) -> Self {
        Self { values }
    }
}

fn default_num_simulations() -> u32 {
    10_000
}

fn default_histogram_bins() -> usize {
    20
}

/// Top-level input for a recovery simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    pub portfolio: Portfolio,
    /// Number of trials (minimum 1).
    #[serde(default = "default_num_simulations")]
    pub num_simulations: u32,
    /// Optional seed for reproducibility. A random master seed is drawn and
    /// reported in the assumptions when absent.
    pub seed: Option<u64>,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

/// Output of a recovery simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub summary: SummaryResult,
    pub histogram: Vec<HistogramBin>,
}

// ---------------------------------------------------------------------------
// Trial kernel
// ---------------------------------------------------------------------------

/// One trial: a Bernoulli draw per position, summing recovered face value.
///
/// `probabilities` and `values` are index-aligned; `values` are already in
/// real monetary units.
#[inline]
fn run_trial<R: Rng + ?Sized>(probabilities: &[f64], values: &[f64], rng: &mut R) -> f64 {
    let mut total = 0.0_f64;
    for (&p, &v) in probabilities.iter().zip(values) {
        if rng.gen::<f64>() < p {
            total += v;
        }
    }
    total
}

fn validate_trial_count(trial_count: u32) -> RecoveryResult<()> {
    if trial_count == 0 {
        return Err(RecoveryError::invalid(
            "trial_count",
            "Must be at least 1",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public API: simulators
// ---------------------------------------------------------------------------

/// Simulate `trial_count` independent recovery outcomes for `portfolio`,
/// drawing every uniform from `rng`.
///
/// Each trial draws one fresh uniform per position; a position recovers when
/// its draw is strictly below its recovery probability. The sample is
/// returned in trial order.
pub fn simulate<R: Rng + ?Sized>(
    portfolio: &Portfolio,
    trial_count: u32,
    rng: &mut R,
) -> RecoveryResult<SimulationSample> {
    validate_trial_count(trial_count)?;

    let probabilities = portfolio.probabilities();
    let values = portfolio.real_face_values();

    info!(
        positions = portfolio.len(),
        trials = trial_count,
        "starting recovery simulation"
    );
    let start = Instant::now();

    let mut out = Vec::with_capacity(trial_count as usize);
    for k in 0..trial_count {
        if k % PROGRESS_INTERVAL == 0 {
            debug!("trial {} of {}", k + 1, trial_count);
        }
        out.push(run_trial(&probabilities, &values, rng));
    }

    info!(
        trials = trial_count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "recovery simulation complete"
    );
    Ok(SimulationSample::from(out))
}

/// Seeded convenience wrapper around [`simulate`]. `None` draws from OS entropy.
pub fn simulate_seeded(
    portfolio: &Portfolio,
    trial_count: u32,
    seed: Option<u64>,
) -> RecoveryResult<SimulationSample> {
    let mut rng = rng_from_seed(seed);
    simulate(portfolio, trial_count, &mut rng)
}

/// Simulate in blocks of [`TRIAL_BLOCK_SIZE`] trials, each block drawing from
/// its own sub-stream of `master_seed`.
///
/// The sample depends only on the portfolio, trial count and master seed:
/// blocks run on the rayon pool when the `parallel` feature is enabled and
/// are stitched back in block order, so thread count never changes the result.
pub fn simulate_partitioned(
    portfolio: &Portfolio,
    trial_count: u32,
    master_seed: u64,
) -> RecoveryResult<SimulationSample> {
    validate_trial_count(trial_count)?;

    let probabilities = portfolio.probabilities();
    let values = portfolio.real_face_values();
    let hierarchy = SeedHierarchy::new(master_seed);
    let n_blocks = trial_count.div_ceil(TRIAL_BLOCK_SIZE);

    info!(
        positions = portfolio.len(),
        trials = trial_count,
        blocks = n_blocks,
        seed = master_seed,
        "starting partitioned recovery simulation"
    );
    let start = Instant::now();

    let run_block = |block: u32| -> Vec<f64> {
        let first = block * TRIAL_BLOCK_SIZE;
        let len = TRIAL_BLOCK_SIZE.min(trial_count - first);
        let mut rng = hierarchy.rng_for_block(u64::from(block));
        let totals = (0..len)
            .map(|_| run_trial(&probabilities, &values, &mut rng))
            .collect();
        debug!("trial {} of {}", first + len, trial_count);
        totals
    };

    #[cfg(feature = "parallel")]
    let blocks: Vec<Vec<f64>> = (0..n_blocks).into_par_iter().map(run_block).collect();
    #[cfg(not(feature = "parallel"))]
    let blocks: Vec<Vec<f64>> = (0..n_blocks).map(run_block).collect();

    let mut out = Vec::with_capacity(trial_count as usize);
    for block in blocks {
        out.extend(block);
    }

    info!(
        trials = trial_count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "partitioned recovery simulation complete"
    );
    Ok(SimulationSample::from(out))
}

// ---------------------------------------------------------------------------
// Public API: simulation run with summary
// ---------------------------------------------------------------------------

/// Simulate, summarise and histogram a portfolio in one call.
pub fn run_recovery_simulation(
    input: &SimulationInput,
) -> RecoveryResult<ComputationOutput<SimulationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_trial_count(input.num_simulations)?;
    if input.histogram_bins == 0 {
        return Err(RecoveryError::invalid("histogram_bins", "Must be at least 1"));
    }
    if input.num_simulations < LOW_TRIAL_WARNING {
        warnings.push(format!(
            "Only {} trials; P5/P95 estimates will be unstable",
            input.num_simulations
        ));
    }

    let seed = input.seed.unwrap_or_else(rand::random);
    let sample = simulate_partitioned(&input.portfolio, input.num_simulations, seed)?;
    let (summary, histogram) =
        summarize_with_histogram(sample, input.num_simulations, input.histogram_bins)?;

    let output = SimulationOutput { summary, histogram };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monte Carlo Recovery Simulation (independent Bernoulli per position)",
        &serde_json::json!({
            "num_simulations": input.num_simulations,
            "seed": seed,
            "seed_supplied": input.seed.is_some(),
            "positions": input.portfolio.len(),
            "face_value_scale": input.portfolio.face_value_scale(),
            "trial_block_size": TRIAL_BLOCK_SIZE,
        }),
        warnings,
        elapsed,
        Precision::Float,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
