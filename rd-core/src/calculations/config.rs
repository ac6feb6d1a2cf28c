//! Engine configuration.
//!
//! Rates are fractions in `[0, 1]`. The defaults match the calculator's
//! historical behavior: a 21% corporate rate for the §280C election, full
//! credit for contractor payments, and no eighty-percent rule.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CreditCalculationInput;
use crate::calculations::common::is_valid_rate;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalculationConfigError {
    #[error("corporate tax rate must be between 0 and 1, got {0}")]
    InvalidCorporateTaxRate(Decimal),

    #[error("contractor qualified rate must be between 0 and 1, got {0}")]
    InvalidContractorQualifiedRate(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationConfig {
    /// Rate used for the reduced §280C credit: `credit * (1 - rate)`.
    pub corporate_tax_rate: Decimal,

    /// Share of contractor research payments that qualifies.
    ///
    /// Set to 0.65 to apply the contract-research limit.
    pub contractor_qualified_rate: Decimal,

    /// Count employees and contractors at 100% once they reach 80% research time.
    pub apply_eighty_percent_rule: bool,
}

impl Default for CalculationConfig {
    fn default() -> Self {
        Self {
            corporate_tax_rate: dec!(0.21),
            contractor_qualified_rate: Decimal::ONE,
            apply_eighty_percent_rule: false,
        }
    }
}

impl CalculationConfig {
    pub fn from_input(input: &CreditCalculationInput) -> Self {
        Self {
            corporate_tax_rate: input.corporate_tax_rate,
            contractor_qualified_rate: input.contractor_qualified_rate,
            apply_eighty_percent_rule: input.apply_eighty_percent_rule,
        }
    }

    /// # Errors
    ///
    /// Returns [`CalculationConfigError`] if either rate is outside `[0, 1]`.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use rd_core::{CalculationConfig, CalculationConfigError};
    ///
    /// let config = CalculationConfig {
    ///     corporate_tax_rate: dec!(1.21),
    ///     ..CalculationConfig::default()
    /// };
    ///
    /// assert_eq!(
    ///     config.validate(),
    ///     Err(CalculationConfigError::InvalidCorporateTaxRate(dec!(1.21)))
    /// );
    /// ```
    pub fn validate(&self) -> Result<(), CalculationConfigError> {
        if !is_valid_rate(self.corporate_tax_rate) {
            return Err(CalculationConfigError::InvalidCorporateTaxRate(
                self.corporate_tax_rate,
            ));
        }
        if !is_valid_rate(self.contractor_qualified_rate) {
            return Err(CalculationConfigError::InvalidContractorQualifiedRate(
                self.contractor_qualified_rate,
            ));
        }
        Ok(())
    }
}
