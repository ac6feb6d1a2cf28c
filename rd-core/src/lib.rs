pub mod calculations;
pub mod models;

pub use calculations::{CalculationConfig, CalculationConfigError, CreditEngine, CreditReport};
pub use models::*;
