use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::CreditMethod;
use crate::calculations::{FederalCreditResults, StateCreditCalculation};

/// Headline numbers for one calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCalculationResult {
    pub total_qre: Decimal,
    pub standard_credit: Decimal,
    pub asc_credit: Decimal,
    pub selected_method: CreditMethod,
    /// Selected federal credit, after §280C when elected.
    pub federal_credit_adjusted: Decimal,
    pub state_credit: Decimal,
    pub total_credit: Decimal,
}

impl fmt::Display for CreditCalculationResult {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let federal_label = format!("Federal ({}):", self.selected_method);
        writeln!(f, "{:<20}${}", "Total QRE:", self.total_qre)?;
        writeln!(f, "{:<20}${}", "Standard credit:", self.standard_credit)?;
        writeln!(f, "{:<20}${}", "ASC credit:", self.asc_credit)?;
        writeln!(f, "{:<20}${}", federal_label, self.federal_credit_adjusted)?;
        writeln!(f, "{:<20}${}", "State credit:", self.state_credit)?;
        write!(f, "{:<20}${}", "Total credit:", self.total_credit)
    }
}

pub struct CreditSummarizer;

impl CreditSummarizer {
    pub fn summarize(
        total_qre: Decimal,
        federal: &FederalCreditResults,
        state: &StateCreditCalculation,
    ) -> CreditCalculationResult {
        let federal_credit_adjusted = federal.selected_credit();
        CreditCalculationResult {
            total_qre,
            standard_credit: federal.standard.credit,
            asc_credit: federal.asc.credit,
            selected_method: federal.selected_method,
            federal_credit_adjusted,
            state_credit: state.credit,
            total_credit: federal_credit_adjusted + state.credit,
        }
    }
}
