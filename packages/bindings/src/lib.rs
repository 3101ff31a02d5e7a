use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use debt_recovery_core::monte_carlo::simulation::SimulationSample;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

#[napi]
pub fn portfolio_report(input_json: String) -> NapiResult<String> {
    let input: debt_recovery_core::portfolio::Portfolio =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = debt_recovery_core::portfolio::report::run_portfolio_report(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[napi]
pub fn run_recovery_simulation(input_json: String) -> NapiResult<String> {
    let input: debt_recovery_core::monte_carlo::simulation::SimulationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = debt_recovery_core::monte_carlo::simulation::run_recovery_simulation(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct SampleInput {
    values: Vec<f64>,
    trial_count: Option<u32>,
}

/// Summary statistics for a sample produced elsewhere, e.g. a cached run.
#[napi]
pub fn summarize_sample(input_json: String) -> NapiResult<String> {
    let input: SampleInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let trial_count = match input.trial_count {
        Some(t) => t,
        None => u32::try_from(input.values.len()).map_err(to_napi_error)?,
    };
    let output = debt_recovery_core::monte_carlo::statistics::summarize(
        SimulationSample::from(input.values),
        trial_count,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

#[napi]
pub fn price_portfolio(input_json: String) -> NapiResult<String> {
    let input: debt_recovery_core::pricing::PricingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        debt_recovery_core::pricing::max_price::run_pricing(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn run_recovery_analysis(input_json: String) -> NapiResult<String> {
    let input: debt_recovery_core::analysis::RecoveryAnalysisInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        debt_recovery_core::analysis::run_recovery_analysis(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
