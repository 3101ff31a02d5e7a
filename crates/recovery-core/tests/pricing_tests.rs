use debt_recovery_core::analysis::{run_recovery_analysis, RecoveryAnalysisInput};
use debt_recovery_core::monte_carlo::statistics::Scenario;
use debt_recovery_core::portfolio::{Portfolio, Position};
use debt_recovery_core::pricing::max_price::{price_portfolio, run_pricing, PricingInput};
use debt_recovery_core::pricing::PricingResult;
use debt_recovery_core::RecoveryError;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Reference deal
// ===========================================================================

#[test]
fn test_eighteen_million_reference_deal() {
    let r = price_portfolio(dec!(18_000_000), dec!(25), dec!(50)).unwrap();
    assert_eq!(
        r,
        PricingResult {
            operating_cost: dec!(4_500_000),
            net_expected_recovery: dec!(13_500_000),
            max_viable_price: dec!(9_000_000),
            return_amount: dec!(4_500_000),
        }
    );
}

#[test]
fn test_reference_deal_through_envelope() {
    let out = run_pricing(&PricingInput {
        expected_value: dec!(18_000_000),
        operating_cost_pct: dec!(25),
        desired_return_pct: dec!(50),
    })
    .unwrap();
    assert_eq!(out.result.max_viable_price, dec!(9_000_000));
    assert!(out.warnings.is_empty());
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
}

#[test]
fn test_return_of_minus_hundred_is_rejected() {
    let err = price_portfolio(dec!(1_000), dec!(25), dec!(-100)).unwrap_err();
    match err {
        RecoveryError::InvalidInput { field, .. } => assert_eq!(field, "desired_return_pct"),
        other => panic!("unexpected error: {other}"),
    }
}

// ===========================================================================
// Scored book end to end
// ===========================================================================

fn scored_book() -> Portfolio {
    // face values in thousands, as delivered by the scoring export
    let positions = (0..1_200)
        .map(|i| Position::new(((i * 13) % 100) as f64 / 100.0, 2.0 + (i % 9) as f64))
        .collect();
    Portfolio::with_scale(positions, 1000.0).unwrap()
}

#[test]
fn test_analysis_price_never_exceeds_scenario_value() {
    let input = RecoveryAnalysisInput {
        portfolio: scored_book(),
        num_simulations: 3_000,
        seed: Some(42),
        scenario: Scenario::Pessimistic,
        operating_cost_pct: dec!(25),
        desired_return_pct: dec!(50),
        histogram_bins: 10,
        include_sample: false,
    };
    let out = run_recovery_analysis(&input).unwrap().result;
    let p = out.pricing;
    assert_eq!(p.operating_cost + p.net_expected_recovery, out.scenario_value);
    assert!(p.max_viable_price < out.scenario_value);
    assert!(p.max_viable_price > Decimal::ZERO);
    let ratio = out.price_to_face.unwrap();
    assert!(ratio > Decimal::ZERO && ratio < Decimal::ONE);
    assert_eq!(out.histogram.iter().map(|b| b.count).sum::<u32>(), 3_000);
}

// ===========================================================================
// Identities
// ===========================================================================

proptest! {
    #[test]
    fn prop_cost_plus_net_equals_expected_value(
        ev_cents in -10_000_000_000i64..10_000_000_000,
        cost_bp in 0i64..10_000,
        ret_bp in -9_999i64..100_000,
    ) {
        let ev = Decimal::new(ev_cents, 2);
        let cost = Decimal::new(cost_bp, 2);
        let ret = Decimal::new(ret_bp, 2);
        let r = price_portfolio(ev, cost, ret).unwrap();

        prop_assert_eq!(r.operating_cost + r.net_expected_recovery, ev);
        prop_assert_eq!(r.max_viable_price + r.return_amount, r.net_expected_recovery);

        let grown = r.max_viable_price * (Decimal::ONE + ret / dec!(100));
        prop_assert!((grown - r.net_expected_recovery).abs() < dec!(0.000001));
    }

    #[test]
    fn prop_price_falls_as_return_rises(
        ev_cents in 1i64..10_000_000_000,
        low_bp in 0i64..5_000,
        step_bp in 1i64..5_000,
    ) {
        let ev = Decimal::new(ev_cents, 2);
        let low = price_portfolio(ev, dec!(25), Decimal::new(low_bp, 2)).unwrap();
        let high = price_portfolio(ev, dec!(25), Decimal::new(low_bp + step_bp, 2)).unwrap();
        prop_assert!(high.max_viable_price < low.max_viable_price);
    }
}
