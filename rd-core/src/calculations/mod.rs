//! R&D credit calculations.
//!
//! The pipeline runs leaf-first: allocation percentages feed the QRE
//! aggregator, whose total drives the federal calculator, whose selected
//! credit in turn feeds the state calculator. [`CreditEngine`] composes the
//! stages for a single snapshot.

pub mod allocation;
pub mod common;
pub mod config;
pub mod engine;
pub mod federal;
pub mod qre;
pub mod state;
pub mod summary;

pub use config::{CalculationConfig, CalculationConfigError};
pub use engine::{CreditEngine, CreditReport};
pub use federal::{
    AscCreditCalculation, FederalCreditCalculator, FederalCreditResults, StandardCreditCalculation,
};
pub use qre::{EmployeeQre, QreAggregation, QreAggregator};
pub use state::{StateCode, StateCreditCalculation, StateCreditCalculator, StateCreditInputs};
pub use summary::{CreditCalculationResult, CreditSummarizer};
