//! State R&D credits.
//!
//! Each of the 51 jurisdictions (50 states plus DC) maps to exactly one
//! [`StateCreditRule`] through the exhaustive [`StateCode::rule`] match. A
//! rule pairs an entity-type gate with a [`StateFormula`]; jurisdictions
//! without a credit carry [`StateFormula::NoCredit`] and the `None` gate.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use rd_core::EntityType;
//! use rd_core::calculations::{StateCreditCalculator, StateCreditInputs};
//!
//! let inputs = StateCreditInputs {
//!     qre: dec!(3000000),
//!     ..StateCreditInputs::default()
//! };
//!
//! let result = StateCreditCalculator::new(true).calculate("AZ", EntityType::SCorp, inputs);
//!
//! assert!(result.eligible);
//! assert_eq!(result.credit, dec!(675000));
//! ```

mod calculator;
mod formula;
mod rules;

pub use calculator::{StateCreditCalculation, StateCreditCalculator};
pub use formula::{Basis, EmployeeTier, StateCreditInputs, StateFormula, Term};
pub use rules::{EntityRestriction, StateCode, StateCreditRule};
