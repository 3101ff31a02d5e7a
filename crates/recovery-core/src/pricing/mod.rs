pub mod max_price;

pub use max_price::{price_portfolio, PricingInput, PricingResult};
