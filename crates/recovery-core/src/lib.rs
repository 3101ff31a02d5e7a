pub mod error;
pub mod types;

#[cfg(feature = "portfolio")]
pub mod portfolio;

#[cfg(feature = "monte_carlo")]
pub mod monte_carlo;

#[cfg(feature = "pricing")]
pub mod pricing;

#[cfg(feature = "analysis")]
pub mod analysis;

pub use error::RecoveryError;
pub use types::*;

/// Standard result type for all debt-recovery operations
pub type RecoveryResult<T> = Result<T, RecoveryError>;
