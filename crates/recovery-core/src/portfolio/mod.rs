pub mod position;
pub mod report;

pub use position::{Portfolio, Position};
