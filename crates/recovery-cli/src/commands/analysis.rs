use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use debt_recovery_core::analysis::{self, RecoveryAnalysisInput};
use debt_recovery_core::monte_carlo::statistics::Scenario;

use super::PositionArgs;
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScenarioArg {
    Pessimistic,
    Mean,
    Optimistic,
}

impl From<ScenarioArg> for Scenario {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::Pessimistic => Scenario::Pessimistic,
            ScenarioArg::Mean => Scenario::Mean,
            ScenarioArg::Optimistic => Scenario::Optimistic,
        }
    }
}

/// Arguments for the end-to-end recovery analysis
#[derive(Args)]
pub struct AnalyseArgs {
    /// Path to JSON input file (RecoveryAnalysisInput)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub positions: PositionArgs,

    /// Number of trials
    #[arg(long, default_value = "10000")]
    pub simulations: u32,

    /// Master seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Point of the distribution to price against
    #[arg(long, value_enum, default_value = "mean")]
    pub scenario: ScenarioArg,

    /// Operating cost as a percentage of the scenario value
    #[arg(long, default_value = "25")]
    pub operating_cost_pct: Decimal,

    /// Return demanded on the price paid, in percent
    #[arg(long, default_value = "50", allow_hyphen_values = true)]
    pub desired_return_pct: Decimal,

    /// Histogram bin count
    #[arg(long, default_value = "20")]
    pub bins: usize,

    /// Include the raw per-trial sample in the output
    #[arg(long)]
    pub include_sample: bool,
}

pub fn run_analyse(args: AnalyseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let analysis_input: RecoveryAnalysisInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(portfolio) = args.positions.load()? {
        RecoveryAnalysisInput {
            portfolio,
            num_simulations: args.simulations,
            seed: args.seed,
            scenario: args.scenario.into(),
            operating_cost_pct: args.operating_cost_pct,
            desired_return_pct: args.desired_return_pct,
            histogram_bins: args.bins,
            include_sample: args.include_sample,
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err(
            "--input <file.json>, --positions <file.csv> or stdin required for analysis".into(),
        );
    };
    let result = analysis::run_recovery_analysis(&analysis_input)?;
    Ok(serde_json::to_value(result)?)
}
