use clap::Args;
use serde_json::Value;

use debt_recovery_core::portfolio::report;
use debt_recovery_core::portfolio::Portfolio;

use super::PositionArgs;
use crate::input;

/// Arguments for the portfolio score report
#[derive(Args)]
pub struct ReportArgs {
    /// Path to JSON input file (Portfolio)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub positions: PositionArgs,
}

pub fn run_report(args: ReportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let portfolio: Portfolio = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(portfolio) = args.positions.load()? {
        portfolio
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json>, --positions <file.csv> or stdin required for report".into());
    };
    let result = report::run_portfolio_report(&portfolio)?;
    Ok(serde_json::to_value(result)?)
}
