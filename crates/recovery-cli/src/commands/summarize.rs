use clap::Args;
use serde_json::Value;

use debt_recovery_core::monte_carlo::simulation::SimulationSample;
use debt_recovery_core::monte_carlo::statistics;

use crate::input;

/// Arguments for summarising an existing sample
#[derive(Args)]
pub struct SummarizeArgs {
    /// Path to a JSON array of per-trial totals
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated per-trial totals
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub values: Option<Vec<f64>>,
}

pub fn run_summarize(args: SummarizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let values: Vec<f64> = if let Some(v) = args.values {
        v
    } else if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--values, --input <file.json> or stdin required for summarize".into());
    };
    summary_record(values)
}

/// The summary record without the raw sample: `trial_count` plus statistics.
fn summary_record(values: Vec<f64>) -> Result<Value, Box<dyn std::error::Error>> {
    let trial_count = u32::try_from(values.len())
        .map_err(|_| format!("Sample of {} values is too large", values.len()))?;
    let result = statistics::summarize(SimulationSample::from(values), trial_count)?;

    let mut record = serde_json::to_value(result.statistics)?;
    if let Value::Object(ref mut map) = record {
        map.insert("trial_count".to_string(), Value::from(result.trial_count));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_carries_trial_count() {
        let record = summary_record(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(record["trial_count"], Value::from(4));
        assert_eq!(record["mean"], Value::from(2.5));
        assert!(record.get("sample").is_none());
    }

    #[test]
    fn test_empty_sample_is_an_error() {
        assert!(summary_record(vec![]).is_err());
    }
}
