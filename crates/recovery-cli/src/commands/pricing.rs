use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use debt_recovery_core::pricing::max_price::{self, PricingInput};

use crate::input;

/// Arguments for maximum viable price
#[derive(Args)]
pub struct PriceArgs {
    /// Path to JSON input file (PricingInput)
    #[arg(long)]
    pub input: Option<String>,

    /// Recovery scenario value in currency units
    #[arg(long, allow_hyphen_values = true)]
    pub expected_value: Option<Decimal>,

    /// Operating cost as a percentage of the scenario value
    #[arg(long, default_value = "25")]
    pub operating_cost_pct: Decimal,

    /// Return demanded on the price paid, in percent
    #[arg(long, default_value = "50", allow_hyphen_values = true)]
    pub desired_return_pct: Decimal,
}

pub fn run_price(args: PriceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let pricing_input: PricingInput = if let Some(expected_value) = args.expected_value {
        PricingInput {
            expected_value,
            operating_cost_pct: args.operating_cost_pct,
            desired_return_pct: args.desired_return_pct,
        }
    } else if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--expected-value, --input <file.json> or stdin required for pricing".into());
    };
    let result = max_price::run_pricing(&pricing_input)?;
    Ok(serde_json::to_value(result)?)
}
