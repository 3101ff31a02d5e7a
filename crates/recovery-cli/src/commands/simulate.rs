use clap::Args;
use serde_json::Value;

use debt_recovery_core::monte_carlo::simulation::{self, SimulationInput};

use super::PositionArgs;
use crate::input;

/// Arguments for a recovery simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON input file (SimulationInput)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub positions: PositionArgs,

    /// Number of trials when reading a CSV table
    #[arg(long, default_value = "10000")]
    pub simulations: u32,

    /// Master seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Histogram bin count
    #[arg(long, default_value = "20")]
    pub bins: usize,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sim_input: SimulationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(portfolio) = args.positions.load()? {
        SimulationInput {
            portfolio,
            num_simulations: args.simulations,
            seed: args.seed,
            histogram_bins: args.bins,
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err(
            "--input <file.json>, --positions <file.csv> or stdin required for simulation".into(),
        );
    };
    let result = simulation::run_recovery_simulation(&sim_input)?;
    Ok(serde_json::to_value(result)?)
}
