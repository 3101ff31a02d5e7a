pub mod cache;
pub mod rng;
pub mod simulation;
pub mod statistics;

pub use simulation::{simulate, simulate_partitioned, simulate_seeded, SimulationSample};
pub use statistics::{
    summarize, summarize_with_histogram, RecoveryStatistics, Scenario, SummaryResult,
};
