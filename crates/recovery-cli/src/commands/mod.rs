pub mod analysis;
pub mod pricing;
pub mod report;
pub mod simulate;
pub mod summarize;

use clap::Args;
use debt_recovery_core::portfolio::Portfolio;

use crate::input::positions::{self, ColumnSelection};

/// Where to read a scored position table from.
#[derive(Args, Debug, Clone, Default)]
pub struct PositionArgs {
    /// Path to a CSV table of scored positions
    #[arg(long)]
    pub positions: Option<String>,

    /// Header of the recovery probability column
    #[arg(long)]
    pub probability_column: Option<String>,

    /// Header of the face value column
    #[arg(long)]
    pub value_column: Option<String>,

    /// Multiplier converting the face value column to currency units
    #[arg(long)]
    pub scale: Option<f64>,
}

impl PositionArgs {
    /// Load the CSV table if `--positions` was given.
    pub fn load(&self) -> Result<Option<Portfolio>, Box<dyn std::error::Error>> {
        let Some(ref path) = self.positions else {
            return Ok(None);
        };
        let selection = ColumnSelection {
            probability: self.probability_column.clone(),
            value: self.value_column.clone(),
            scale: self.scale,
        };
        Ok(Some(positions::read_positions(path, &selection)?))
    }
}
