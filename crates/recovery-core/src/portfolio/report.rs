//! Closed-form portfolio score report.
//!
//! Summarises a scored portfolio before any simulation runs: how much face
//! value sits in each recovery-probability band, the analytic expected
//! recovery, and a normal approximation of the recovery distribution. Useful
//! as a sanity check against the Monte Carlo figures.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::time::Instant;

use crate::portfolio::position::Portfolio;
use crate::types::{with_metadata, ComputationOutput, Precision};
use crate::RecoveryResult;

/// Lower probability bound of each rank, best first.
const RANK_A_FLOOR: f64 = 0.75;
const RANK_B_FLOOR: f64 = 0.50;
const RANK_C_FLOOR: f64 = 0.25;

/// Recovery-probability band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rank {
    /// p >= 0.75
    A,
    /// 0.50 <= p < 0.75
    B,
    /// 0.25 <= p < 0.50
    C,
    /// p < 0.25
    D,
}

impl Rank {
    pub fn classify(recovery_probability: f64) -> Self {
        if recovery_probability >= RANK_A_FLOOR {
            Rank::A
        } else if recovery_probability >= RANK_B_FLOOR {
            Rank::B
        } else if recovery_probability >= RANK_C_FLOOR {
            Rank::C
        } else {
            Rank::D
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rank::A => write!(f, "A"),
            Rank::B => write!(f, "B"),
            Rank::C => write!(f, "C"),
            Rank::D => write!(f, "D"),
        }
    }
}

/// Positions and face value falling in one rank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankBucket {
    pub rank: Rank,
    pub position_count: usize,
    /// Face value in real monetary units.
    pub face_value: f64,
}

/// Output of the portfolio score report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub position_count: usize,
    /// Sum of face values in real monetary units.
    pub total_face_value: f64,
    /// Sum of p * v.
    pub expected_recovery: f64,
    /// expected_recovery / total_face_value; zero for a zero-value book.
    pub weighted_average_probability: f64,
    /// sqrt(sum of p(1-p) v^2): the exact std dev of the recovered total.
    pub analytic_std_dev: f64,
    /// 5th percentile under a normal approximation.
    pub normal_p5: f64,
    /// 95th percentile under a normal approximation.
    pub normal_p95: f64,
    /// Buckets in rank order A, B, C, D.
    pub ranks: Vec<RankBucket>,
}

/// Build the closed-form report for a portfolio.
pub fn portfolio_report(portfolio: &Portfolio) -> RecoveryResult<PortfolioReport> {
    let values = portfolio.real_face_values();

    let mut buckets: Vec<RankBucket> = [Rank::A, Rank::B, Rank::C, Rank::D]
        .into_iter()
        .map(|rank| RankBucket {
            rank,
            position_count: 0,
            face_value: 0.0,
        })
        .collect();

    let mut total = 0.0_f64;
    let mut expected = 0.0_f64;
    let mut variance = 0.0_f64;

    for (position, &v) in portfolio.positions().iter().zip(&values) {
        let p = position.recovery_probability;
        total += v;
        expected += p * v;
        variance += p * (1.0 - p) * v * v;

        let idx = match Rank::classify(p) {
            Rank::A => 0,
            Rank::B => 1,
            Rank::C => 2,
            Rank::D => 3,
        };
        buckets[idx].position_count += 1;
        buckets[idx].face_value += v;
    }

    let std_dev = variance.sqrt();
    let weighted_average_probability = if total > 0.0 { expected / total } else { 0.0 };

    let (normal_p5, normal_p95) = if std_dev > 0.0 {
        // std_dev > 0 and finite, so construction cannot fail
        match Normal::new(expected, std_dev) {
            Ok(n) => (n.inverse_cdf(0.05), n.inverse_cdf(0.95)),
            Err(_) => (expected, expected),
        }
    } else {
        (expected, expected)
    };

    Ok(PortfolioReport {
        position_count: portfolio.len(),
        total_face_value: total,
        expected_recovery: expected,
        weighted_average_probability,
        analytic_std_dev: std_dev,
        normal_p5,
        normal_p95,
        ranks: buckets,
    })
}

/// [`portfolio_report`] wrapped in the standard computation envelope.
pub fn run_portfolio_report(
    portfolio: &Portfolio,
) -> RecoveryResult<ComputationOutput<PortfolioReport>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let report = portfolio_report(portfolio)?;
    if report.total_face_value == 0.0 {
        warnings.push("Portfolio has zero total face value".to_string());
    }
    if report.analytic_std_dev == 0.0 {
        warnings.push(
            "Every position has probability 0 or 1; the recovery outcome is deterministic"
                .to_string(),
        );
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Portfolio Recovery Score Report",
        &serde_json::json!({
            "position_count": portfolio.len(),
            "face_value_scale": portfolio.face_value_scale(),
            "rank_floors": { "A": RANK_A_FLOOR, "B": RANK_B_FLOOR, "C": RANK_C_FLOOR },
        }),
        warnings,
        elapsed,
        Precision::Float,
        report,
    ))
}
