//! Maximum viable purchase price for a debt portfolio.
//!
//! Given a recovery scenario value, the operating cost of collecting it and
//! the return the buyer demands on the price paid:
//!
//! ```text
//! operating_cost        = expected_value * cost% / 100
//! net_expected_recovery = expected_value - operating_cost
//! max_viable_price      = net_expected_recovery / (1 + return% / 100)
//! return_amount         = net_expected_recovery - max_viable_price
//! ```
//!
//! The return is earned on the price paid, so `net = price * (1 + r)`.
//! Any purchase price at or below `max_viable_price` preserves the return.
//! Negative scenario values flow through the algebra unchanged.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RecoveryError;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Precision};
use crate::RecoveryResult;

const HUNDRED: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

fn default_operating_cost_pct() -> Percent {
    dec!(25)
}

fn default_desired_return_pct() -> Percent {
    dec!(50)
}

/// Input for a pricing calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingInput {
    /// Recovery scenario value in real monetary units.
    pub expected_value: Money,
    /// Collection cost as a percentage of the scenario value (25 = 25%).
    #[serde(default = "default_operating_cost_pct")]
    pub operating_cost_pct: Percent,
    /// Return demanded on the price paid (50 = 50%).
    #[serde(default = "default_desired_return_pct")]
    pub desired_return_pct: Percent,
}

/// Price recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub operating_cost: Money,
    pub net_expected_recovery: Money,
    pub max_viable_price: Money,
    pub return_amount: Money,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Convert a simulated float into Money. Rejects NaN and infinities.
pub fn money_from_f64(field: &str, value: f64) -> RecoveryResult<Money> {
    if !value.is_finite() {
        return Err(RecoveryError::invalid(
            field,
            format!("Must be a finite amount, got {value}"),
        ));
    }
    Decimal::from_f64(value).ok_or_else(|| {
        RecoveryError::invalid(field, format!("{value} is outside the decimal range"))
    })
}

fn out_of_range(field: &str) -> RecoveryError {
    RecoveryError::invalid(field, "Pricing result exceeds the decimal range")
}

/// Split a scenario value into operating cost, price ceiling and return.
pub fn price_portfolio(
    expected_value: Money,
    operating_cost_pct: Percent,
    desired_return_pct: Percent,
) -> RecoveryResult<PricingResult> {
    if desired_return_pct <= -HUNDRED {
        return Err(RecoveryError::invalid(
            "desired_return_pct",
            format!("Must be greater than -100%, got {desired_return_pct}%"),
        ));
    }

    let operating_cost = expected_value
        .checked_mul(operating_cost_pct / HUNDRED)
        .ok_or_else(|| out_of_range("operating_cost_pct"))?;
    let net_expected_recovery = expected_value
        .checked_sub(operating_cost)
        .ok_or_else(|| out_of_range("expected_value"))?;
    let growth = Decimal::ONE
        .checked_add(desired_return_pct / HUNDRED)
        .ok_or_else(|| out_of_range("desired_return_pct"))?;
    let max_viable_price = net_expected_recovery
        .checked_div(growth)
        .ok_or_else(|| out_of_range("desired_return_pct"))?;
    let return_amount = net_expected_recovery
        .checked_sub(max_viable_price)
        .ok_or_else(|| out_of_range("desired_return_pct"))?;

    Ok(PricingResult {
        operating_cost,
        net_expected_recovery,
        max_viable_price,
        return_amount,
    })
}

/// [`price_portfolio`] wrapped in the standard computation envelope.
pub fn run_pricing(input: &PricingInput) -> RecoveryResult<ComputationOutput<PricingResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = price_portfolio(
        input.expected_value,
        input.operating_cost_pct,
        input.desired_return_pct,
    )?;

    if result.net_expected_recovery < Decimal::ZERO {
        warnings.push(
            "Net expected recovery is negative; no positive purchase price meets the target"
                .to_string(),
        );
    }
    if input.operating_cost_pct > HUNDRED {
        warnings.push(format!(
            "Operating cost of {}% exceeds the recovered value",
            input.operating_cost_pct
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Maximum Viable Price (return on price paid)",
        input,
        warnings,
        elapsed,
        Precision::Decimal,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_deal() {
        let r = price_portfolio(dec!(18_000_000), dec!(25), dec!(50)).unwrap();
        assert_eq!(r.operating_cost, dec!(4_500_000));
        assert_eq!(r.net_expected_recovery, dec!(13_500_000));
        assert_eq!(r.max_viable_price, dec!(9_000_000));
        assert_eq!(r.return_amount, dec!(4_500_000));
    }

    #[test]
    fn test_zero_return_price_equals_net() {
        let r = price_portfolio(dec!(1_000_000), dec!(20), Decimal::ZERO).unwrap();
        assert_eq!(r.max_viable_price, r.net_expected_recovery);
        assert_eq!(r.return_amount, Decimal::ZERO);
    }

    #[test]
    fn test_negative_expected_value_propagates() {
        let r = price_portfolio(dec!(-1_000), dec!(10), dec!(25)).unwrap();
        assert_eq!(r.operating_cost, dec!(-100));
        assert_eq!(r.net_expected_recovery, dec!(-900));
        assert_eq!(r.max_viable_price, dec!(-720));
        assert_eq!(r.return_amount, dec!(-180));
    }

    #[test]
    fn test_return_at_or_below_minus_hundred_rejected() {
        assert!(price_portfolio(dec!(100), dec!(10), dec!(-100)).is_err());
        assert!(price_portfolio(dec!(100), dec!(10), dec!(-150)).is_err());
        assert!(price_portfolio(dec!(100), dec!(10), dec!(-99.9)).is_ok());
    }

    #[test]
    fn test_overflowing_cost_is_invalid_input() {
        let err = price_portfolio(
            dec!(70_000_000_000_000_000_000_000_000_000),
            dec!(200),
            Decimal::ZERO,
        )
        .unwrap_err();
        assert!(matches!(err, RecoveryError::InvalidInput { .. }));
    }

    #[test]
    fn test_return_near_minus_hundred_overflows_to_error() {
        let err = price_portfolio(
            dec!(1_000_000_000_000_000_000_000),
            Decimal::ZERO,
            dec!(-99.99999999999999999999999),
        )
        .unwrap_err();
        match err {
            RecoveryError::InvalidInput { field, .. } => assert_eq!(field, "desired_return_pct"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cost_plus_net_is_exact() {
        let r = price_portfolio(dec!(1234567.89), dec!(17.3), dec!(42)).unwrap();
        assert_eq!(r.operating_cost + r.net_expected_recovery, dec!(1234567.89));
    }

    #[test]
    fn test_money_from_f64() {
        assert_eq!(money_from_f64("v", 1500.0).unwrap(), dec!(1500));
        assert!(money_from_f64("v", f64::NAN).is_err());
        assert!(money_from_f64("v", f64::INFINITY).is_err());
    }

    #[test]
    fn test_run_pricing_envelope_and_warnings() {
        let input = PricingInput {
            expected_value: dec!(-500),
            operating_cost_pct: dec!(25),
            desired_return_pct: dec!(50),
        };
        let out = run_pricing(&input).unwrap();
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
        assert!(out.warnings.iter().any(|w| w.contains("negative")));
    }

    #[test]
    fn test_input_defaults() {
        let input: PricingInput = serde_json::from_str(r#"{"expected_value": 1000}"#).unwrap();
        assert_eq!(input.operating_cost_pct, dec!(25));
        assert_eq!(input.desired_return_pct, dec!(50));
    }
}
