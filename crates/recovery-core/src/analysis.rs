//! End-to-end recovery analysis: scores → simulation → statistics → price.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

use crate::error::RecoveryError;
use crate::monte_carlo::simulation::{simulate_partitioned, SimulationSample};
use crate::monte_carlo::statistics::{
    summarize_with_histogram, HistogramBin, RecoveryStatistics, Scenario,
};
use crate::portfolio::report::{portfolio_report, PortfolioReport};
use crate::portfolio::Portfolio;
use crate::pricing::max_price::{money_from_f64, price_portfolio, PricingResult};
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Precision};
use crate::RecoveryResult;

const LOW_TRIAL_WARNING: u32 = 1_000;

fn default_num_simulations() -> u32 {
    10_000
}

fn default_operating_cost_pct() -> Percent {
    dec!(25)
}

fn default_desired_return_pct() -> Percent {
    dec!(50)
}

fn default_histogram_bins() -> usize {
    20
}

/// Input for a full recovery analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryAnalysisInput {
    pub portfolio: Portfolio,
    #[serde(default = "default_num_simulations")]
    pub num_simulations: u32,
    pub seed: Option<u64>,
    /// Point of the simulated distribution to price against.
    #[serde(default)]
    pub scenario: Scenario,
    #[serde(default = "default_operating_cost_pct")]
    pub operating_cost_pct: Percent,
    #[serde(default = "default_desired_return_pct")]
    pub desired_return_pct: Percent,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
    /// Attach the raw per-trial sample to the output.
    #[serde(default)]
    pub include_sample: bool,
}

/// Output of a full recovery analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryAnalysisOutput {
    pub portfolio: PortfolioReport,
    pub trial_count: u32,
    pub statistics: RecoveryStatistics,
    pub histogram: Vec<HistogramBin>,
    pub scenario: Scenario,
    pub scenario_value: Money,
    pub pricing: PricingResult,
    /// max_viable_price / total face value; `None` for a zero-value book.
    pub price_to_face: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<SimulationSample>,
}

/// Run the full pipeline for one scored portfolio.
pub fn run_recovery_analysis(
    input: &RecoveryAnalysisInput,
) -> RecoveryResult<ComputationOutput<RecoveryAnalysisOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // All argument checks happen before the first draw.
    if input.num_simulations == 0 {
        return Err(RecoveryError::invalid("num_simulations", "Must be at least 1"));
    }
    if input.histogram_bins == 0 {
        return Err(RecoveryError::invalid("histogram_bins", "Must be at least 1"));
    }
    if input.desired_return_pct <= dec!(-100) {
        return Err(RecoveryError::invalid(
            "desired_return_pct",
            format!("Must be greater than -100%, got {}%", input.desired_return_pct),
        ));
    }

    let report = portfolio_report(&input.portfolio)?;
    if report.analytic_std_dev == 0.0 {
        warn!("portfolio outcome is deterministic; every trial will be identical");
        warnings.push("Every position has probability 0 or 1; simulated spread is zero".into());
    }
    if input.num_simulations < LOW_TRIAL_WARNING {
        warnings.push(format!(
            "Only {} trials; P5/P95 estimates will be unstable",
            input.num_simulations
        ));
    }

    let total_face = money_from_f64("total_face_value", report.total_face_value)?;

    let seed = input.seed.unwrap_or_else(rand::random);
    let sample = simulate_partitioned(&input.portfolio, input.num_simulations, seed)?;
    let (summary, histogram) =
        summarize_with_histogram(sample, input.num_simulations, input.histogram_bins)?;

    let raw_scenario = summary.statistics.scenario_value(input.scenario);
    let scenario_value = money_from_f64("scenario_value", raw_scenario)?;
    let pricing = price_portfolio(
        scenario_value,
        input.operating_cost_pct,
        input.desired_return_pct,
    )?;

    if pricing.max_viable_price <= Decimal::ZERO {
        warnings.push(format!(
            "{} scenario leaves no room for a positive purchase price",
            input.scenario
        ));
    }

    let price_to_face = if total_face.is_zero() {
        None
    } else {
        Some(
            pricing
                .max_viable_price
                .checked_div(total_face)
                .ok_or_else(|| {
                    RecoveryError::invalid("price_to_face", "Ratio exceeds the decimal range")
                })?,
        )
    };

    info!(
        scenario = %input.scenario,
        scenario_value = %scenario_value,
        max_viable_price = %pricing.max_viable_price,
        "recovery analysis priced"
    );

    let output = RecoveryAnalysisOutput {
        portfolio: report,
        trial_count: summary.trial_count,
        statistics: summary.statistics,
        histogram,
        scenario: input.scenario,
        scenario_value,
        pricing,
        price_to_face,
        sample: input.include_sample.then_some(summary.sample),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monte Carlo Recovery Simulation + Maximum Viable Price",
        &serde_json::json!({
            "num_simulations": input.num_simulations,
            "seed": seed,
            "seed_supplied": input.seed.is_some(),
            "positions": input.portfolio.len(),
            "face_value_scale": input.portfolio.face_value_scale(),
            "scenario": input.scenario,
            "operating_cost_pct": input.operating_cost_pct,
            "desired_return_pct": input.desired_return_pct,
            "return_basis": "price_paid",
        }),
        warnings,
        elapsed,
        Precision::Decimal,
        output,
    ))
}
