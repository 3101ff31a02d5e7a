//! Positions and the validated portfolio the simulator consumes.
//!
//! A [`Portfolio`] is built once from caller data and never mutated. Face
//! values are kept in their stored (scaled) unit; [`Portfolio::real_face_values`]
//! converts them to real money in a single pass so downstream code never
//! re-applies the scale per trial.

use serde::{Deserialize, Serialize};

use crate::error::RecoveryError;
use crate::RecoveryResult;

/// One delinquent debt position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Estimated probability that the debt is collected, in [0, 1].
    pub recovery_probability: f64,
    /// Outstanding amount in the portfolio's stored unit (see `face_value_scale`).
    pub face_value: f64,
}

impl Position {
    pub fn new(recovery_probability: f64, face_value: f64) -> Self {
        Self {
            recovery_probability,
            face_value,
        }
    }
}

fn default_face_value_scale() -> f64 {
    1.0
}

/// Ordered, validated collection of positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PortfolioFields")]
pub struct Portfolio {
    positions: Vec<Position>,
    face_value_scale: f64,
}

/// Unvalidated wire shape of a portfolio.
#[derive(Debug, Clone, Deserialize)]
struct PortfolioFields {
    positions: Vec<Position>,
    #[serde(default = "default_face_value_scale")]
    face_value_scale: f64,
}

impl TryFrom<PortfolioFields> for Portfolio {
    type Error = RecoveryError;

    fn try_from(fields: PortfolioFields) -> Result<Self, Self::Error> {
        Portfolio::with_scale(fields.positions, fields.face_value_scale)
    }
}

impl Portfolio {
    /// Build a portfolio whose face values are already in real monetary units.
    pub fn new(positions: Vec<Position>) -> RecoveryResult<Self> {
        Self::with_scale(positions, 1.0)
    }

    /// Build a portfolio whose face values are stored in a scaled unit,
    /// e.g. `scale = 1000.0` when the table holds thousands.
    pub fn with_scale(positions: Vec<Position>, face_value_scale: f64) -> RecoveryResult<Self> {
        if !face_value_scale.is_finite() || face_value_scale <= 0.0 {
            return Err(RecoveryError::invalid(
                "face_value_scale",
                format!("Must be a positive finite number, got {face_value_scale}"),
            ));
        }
        if positions.is_empty() {
            return Err(RecoveryError::invalid(
                "positions",
                "Portfolio must contain at least one position",
            ));
        }
        for (i, p) in positions.iter().enumerate() {
            validate_position(i, p, face_value_scale)?;
        }
        let portfolio = Self {
            positions,
            face_value_scale,
        };
        let total = portfolio.total_face_value();
        if !total.is_finite() {
            return Err(RecoveryError::invalid(
                "face_value",
                format!("Total face value overflows at scale {face_value_scale}"),
            ));
        }
        Ok(portfolio)
    }

    /// Build a portfolio from two index-aligned columns.
    pub fn from_columns(
        probabilities: &[f64],
        face_values: &[f64],
        face_value_scale: f64,
    ) -> RecoveryResult<Self> {
        if probabilities.len() != face_values.len() {
            return Err(RecoveryError::invalid(
                "positions",
                format!(
                    "Column length mismatch: {} probabilities vs {} face values",
                    probabilities.len(),
                    face_values.len()
                ),
            ));
        }
        let positions = probabilities
            .iter()
            .zip(face_values)
            .map(|(&p, &v)| Position::new(p, v))
            .collect();
        Self::with_scale(positions, face_value_scale)
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn face_value_scale(&self) -> f64 {
        self.face_value_scale
    }

    pub fn probabilities(&self) -> Vec<f64> {
        self.positions.iter().map(|p| p.recovery_probability).collect()
    }

    /// Face values converted to real monetary units.
    pub fn real_face_values(&self) -> Vec<f64> {
        self.positions
            .iter()
            .map(|p| p.face_value * self.face_value_scale)
            .collect()
    }

    /// Sum of face values in real monetary units.
    pub fn total_face_value(&self) -> f64 {
        self.real_face_values().iter().sum()
    }
}

fn validate_position(index: usize, position: &Position, scale: f64) -> RecoveryResult<()> {
    let p = position.recovery_probability;
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(RecoveryError::invalid(
            "recovery_probability",
            format!("Position {index}: must be within [0, 1], got {p}"),
        ));
    }
    let v = position.face_value;
    if !v.is_finite() || v < 0.0 {
        return Err(RecoveryError::invalid(
            "face_value",
            format!("Position {index}: must be a non-negative finite amount, got {v}"),
        ));
    }
    if !(v * scale).is_finite() {
        return Err(RecoveryError::invalid(
            "face_value",
            format!("Position {index}: {v} overflows at scale {scale}"),
        ));
    }
    Ok(())
}
