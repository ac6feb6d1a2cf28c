//! Federal research credit under IRC §41.
//!
//! Two methods are computed side by side for every snapshot:
//!
//! | Method | Lookback | Credit |
//! |--------|----------|--------|
//! | Standard (regular) | 4 prior years | 20% of QRE above `max(fixed base, 50% of QRE)` |
//! | ASC | 3 prior years | 14% of QRE above the prior average; 6% of QRE without 3 years |
//!
//! The lookback takes the most recent history records before the tax year,
//! whatever their calendar spacing; a record only counts when its effective
//! QRE is positive. Credits are rounded to
//! whole dollars. Under the §280C election the reported credit is reduced to
//! `credit * (1 - corporate_tax_rate)`.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use rd_core::{HistoricalData, HistoricalYear};
//! use rd_core::calculations::{CalculationConfig, FederalCreditCalculator};
//!
//! let history: HistoricalData = [(2023, dec!(100000)), (2022, dec!(120000)), (2021, dec!(110000))]
//!     .into_iter()
//!     .map(|(year, qre)| (year, HistoricalYear { qre, ..HistoricalYear::default() }))
//!     .collect();
//!
//! let calculator = FederalCreditCalculator::new(CalculationConfig::default(), false);
//! let asc = calculator.asc(2024, dec!(200000), &history);
//!
//! // 14% of (200,000 - 110,000)
//! assert_eq!(asc.credit, dec!(12600));
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::CalculationConfig;
use crate::calculations::common::{non_negative, round_to_dollar};
use crate::{CreditMethod, HistoricalData};

pub const STANDARD_LOOKBACK_YEARS: usize = 4;
pub const ASC_LOOKBACK_YEARS: usize = 3;

const STANDARD_CREDIT_RATE: Decimal = dec!(0.20);
const MAX_BASE_PERCENTAGE: Decimal = dec!(0.16);
const MIN_BASE_FRACTION: Decimal = dec!(0.5);
const ASC_CREDIT_RATE: Decimal = dec!(0.14);
const ASC_STARTUP_RATE: Decimal = dec!(0.06);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardCreditCalculation {
    pub avg_qre: Decimal,
    pub avg_gross_receipts: Decimal,
    pub base_percentage: Decimal,
    pub fixed_base_amount: Decimal,
    pub base_amount: Decimal,
    pub incremental_qre: Decimal,
    pub credit: Decimal,
    /// Present only under the §280C election.
    pub adjusted_credit: Option<Decimal>,
    pub is_eligible: bool,
    pub missing_data: Vec<String>,
    pub calculation_details: Vec<String>,
}

impl StandardCreditCalculation {
    pub fn final_credit(&self) -> Decimal {
        self.adjusted_credit.unwrap_or(self.credit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AscCreditCalculation {
    pub prior_years_used: usize,
    pub avg_prior_qre: Decimal,
    pub incremental_qre: Decimal,
    pub credit: Decimal,
    pub adjusted_credit: Option<Decimal>,
    /// True when the 6% startup rate was used.
    pub is_startup: bool,
    pub missing_data: Vec<String>,
    pub calculation_details: Vec<String>,
}

impl AscCreditCalculation {
    pub fn final_credit(&self) -> Decimal {
        self.adjusted_credit.unwrap_or(self.credit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederalCreditResults {
    pub standard: StandardCreditCalculation,
    pub asc: AscCreditCalculation,
    pub selected_method: CreditMethod,
    pub use_280c: bool,
}

impl FederalCreditResults {
    /// Selected method's credit, after §280C when elected.
    pub fn selected_credit(&self) -> Decimal {
        match self.selected_method {
            CreditMethod::Standard => self.standard.final_credit(),
            CreditMethod::Asc => self.asc.final_credit(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FederalCreditCalculator {
    config: CalculationConfig,
    use_280c: bool,
}

impl FederalCreditCalculator {
    pub fn new(
        config: CalculationConfig,
        use_280c: bool,
    ) -> Self {
        Self { config, use_280c }
    }

    /// Computes both methods and resolves the selected one.
    ///
    /// Without an explicit selection the Standard method is chosen when
    /// eligible, otherwise ASC.
    pub fn calculate(
        &self,
        year: i32,
        current_qre: Decimal,
        history: &HistoricalData,
        selected: Option<CreditMethod>,
    ) -> FederalCreditResults {
        let standard = self.standard(year, current_qre, history);
        let asc = self.asc(year, current_qre, history);

        let selected_method = selected.unwrap_or(if standard.is_eligible {
            CreditMethod::Standard
        } else {
            CreditMethod::Asc
        });

        debug!(
            year,
            standard = %standard.final_credit(),
            asc = %asc.final_credit(),
            method = selected_method.as_str(),
            "Calculated federal credits"
        );

        FederalCreditResults {
            standard,
            asc,
            selected_method,
            use_280c: self.use_280c,
        }
    }

    pub fn standard(
        &self,
        year: i32,
        current_qre: Decimal,
        history: &HistoricalData,
    ) -> StandardCreditCalculation {
        let mut details = Vec::new();
        let mut missing = Vec::new();

        let base_years = history.qualifying_prior_years(year, STANDARD_LOOKBACK_YEARS);
        for (base_year, data) in &base_years {
            details.push(format!(
                "Year {base_year}: QRE=${}, Gross Receipts=${}",
                data.effective_qre(),
                data.gross_receipts
            ));
        }

        let (avg_qre, avg_gross_receipts) = if base_years.is_empty() {
            warn!(year, "No base-year QRE available for standard credit");
            details.push("No valid QRE data found in base years. Using 0% base percentage.".to_string());
            missing.push(format!(
                "No QRE history in the {STANDARD_LOOKBACK_YEARS} records before {year}"
            ));
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            if base_years.len() < STANDARD_LOOKBACK_YEARS {
                missing.push(format!(
                    "Only {} of {STANDARD_LOOKBACK_YEARS} base years have QRE data",
                    base_years.len()
                ));
            }
            let count = Decimal::from(base_years.len());
            let qre: Decimal = base_years.iter().map(|(_, d)| d.effective_qre()).sum();
            let receipts: Decimal = base_years.iter().map(|(_, d)| d.gross_receipts).sum();
            (qre / count, receipts / count)
        };

        let base_percentage = self.base_percentage(avg_qre, avg_gross_receipts);
        details.push(format!(
            "Base Percentage: {}%",
            (base_percentage * Decimal::ONE_HUNDRED).round_dp(2)
        ));

        let fixed_base_amount = round_to_dollar(base_percentage * avg_gross_receipts);
        details.push(format!("Fixed Base Amount: ${fixed_base_amount}"));

        let base_amount = fixed_base_amount.max(round_to_dollar(MIN_BASE_FRACTION * current_qre));
        details.push(format!("Base Amount (after 50% QRE min): ${base_amount}"));

        let incremental_qre = non_negative(current_qre - base_amount);
        details.push(format!("Incremental QRE: ${incremental_qre}"));

        let credit = round_to_dollar(STANDARD_CREDIT_RATE * incremental_qre);
        details.push(format!("Credit (20%): ${credit}"));

        let adjusted_credit = self.apply_280c(credit, &mut details);

        StandardCreditCalculation {
            avg_qre: round_to_dollar(avg_qre),
            avg_gross_receipts: round_to_dollar(avg_gross_receipts),
            base_percentage,
            fixed_base_amount,
            base_amount,
            incremental_qre,
            credit,
            adjusted_credit,
            is_eligible: true,
            missing_data: missing,
            calculation_details: details,
        }
    }

    pub fn asc(
        &self,
        year: i32,
        current_qre: Decimal,
        history: &HistoricalData,
    ) -> AscCreditCalculation {
        let mut details = Vec::new();
        let mut missing = Vec::new();

        let prior_years = history.qualifying_prior_years(year, ASC_LOOKBACK_YEARS);
        for (prior_year, data) in &prior_years {
            details.push(format!("ASC Prior Year {prior_year}: QRE=${}", data.effective_qre()));
        }

        let avg_prior_qre = if prior_years.is_empty() {
            Decimal::ZERO
        } else {
            let total: Decimal = prior_years.iter().map(|(_, d)| d.effective_qre()).sum();
            total / Decimal::from(prior_years.len())
        };

        let full_history = prior_years.len() == ASC_LOOKBACK_YEARS;
        let (incremental_qre, credit, is_startup) = if full_history {
            details.push(format!(
                "ASC Multi-year: Avg Prior QRE = ${}",
                round_to_dollar(avg_prior_qre)
            ));
            let incremental = non_negative(current_qre - avg_prior_qre);
            details.push(format!("Incremental QRE: ${}", round_to_dollar(incremental)));
            let credit = round_to_dollar(ASC_CREDIT_RATE * incremental);
            details.push(format!("Credit (14%): ${credit}"));
            (round_to_dollar(incremental), credit, false)
        } else {
            if prior_years.is_empty() {
                warn!(year, "No prior-year QRE; using ASC startup rate");
                let note = "No prior year QRE data available - using startup provision (6% of current year QRE)";
                details.push(note.to_string());
                missing.push(note.to_string());
            } else {
                warn!(
                    year,
                    prior_years = prior_years.len(),
                    "Fewer than three prior years; using ASC startup rate"
                );
                details.push(format!(
                    "ASC Partial history: Avg Prior QRE = ${}",
                    round_to_dollar(avg_prior_qre)
                ));
                details.push("Using startup provision (6% of current QRE)".to_string());
                missing.push(format!(
                    "Using {} prior year(s) for ASC calculation",
                    prior_years.len()
                ));
            }
            let credit = round_to_dollar(ASC_STARTUP_RATE * current_qre);
            details.push(format!("Credit (6%): ${credit}"));
            (Decimal::ZERO, credit, true)
        };

        let adjusted_credit = self.apply_280c(credit, &mut details);

        AscCreditCalculation {
            prior_years_used: prior_years.len(),
            avg_prior_qre: round_to_dollar(avg_prior_qre),
            incremental_qre,
            credit,
            adjusted_credit,
            is_startup,
            missing_data: missing,
            calculation_details: details,
        }
    }

    /// `min(avg_qre / avg_gross_receipts, 16%)`, or zero without receipts.
    fn base_percentage(
        &self,
        avg_qre: Decimal,
        avg_gross_receipts: Decimal,
    ) -> Decimal {
        if avg_gross_receipts <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (avg_qre / avg_gross_receipts).min(MAX_BASE_PERCENTAGE)
    }

    fn apply_280c(
        &self,
        credit: Decimal,
        details: &mut Vec<String>,
    ) -> Option<Decimal> {
        if !self.use_280c {
            return None;
        }
        let adjusted = round_to_dollar(credit * (Decimal::ONE - self.config.corporate_tax_rate));
        details.push(format!("280C Adjusted Credit: ${adjusted}"));
        Some(adjusted)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::HistoricalYear;

    fn history(entries: &[(i32, Decimal, Decimal)]) -> HistoricalData {
        entries
            .iter()
            .map(|&(year, qre, gross_receipts)| {
                (
                    year,
                    HistoricalYear {
                        qre,
                        gross_receipts,
                        ..HistoricalYear::default()
                    },
                )
            })
            .collect()
    }

    fn calculator() -> FederalCreditCalculator {
        FederalCreditCalculator::new(CalculationConfig::default(), false)
    }

    fn calculator_280c() -> FederalCreditCalculator {
        FederalCreditCalculator::new(CalculationConfig::default(), true)
    }

    /// Initializes tracing subscriber for tests that exercise warning paths.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    // =========================================================================
    // standard tests
    // =========================================================================

    #[test]
    fn standard_without_history_uses_half_of_qre_as_base() {
        let _guard = init_test_tracing();

        let result = calculator().standard(2024, dec!(100000), &HistoricalData::new());

        assert_eq!(result.base_percentage, Decimal::ZERO);
        assert_eq!(result.base_amount, dec!(50000));
        assert_eq!(result.incremental_qre, dec!(50000));
        assert_eq!(result.credit, dec!(10000));
        assert!(result.is_eligible);
        assert_eq!(result.missing_data.len(), 1);
    }

    #[test]
    fn standard_uses_fixed_base_when_larger() {
        let history = history(&[
            (2023, dec!(150000), dec!(1000000)),
            (2022, dec!(150000), dec!(1000000)),
            (2021, dec!(150000), dec!(1000000)),
            (2020, dec!(150000), dec!(1000000)),
        ]);

        let result = calculator().standard(2024, dec!(300000), &history);

        // 15% of 1,000,000 = 150,000 = 50% of 300,000
        assert_eq!(result.base_percentage, dec!(0.15));
        assert_eq!(result.fixed_base_amount, dec!(150000));
        assert_eq!(result.base_amount, dec!(150000));
        assert_eq!(result.credit, dec!(30000));
        assert!(result.missing_data.is_empty());
    }

    #[test]
    fn standard_caps_base_percentage_at_sixteen() {
        let history = history(&[(2023, dec!(500000), dec!(1000000))]);

        let result = calculator().standard(2024, dec!(400000), &history);

        assert_eq!(result.base_percentage, dec!(0.16));
        assert_eq!(result.fixed_base_amount, dec!(160000));
        assert_eq!(result.base_amount, dec!(200000));
        assert_eq!(result.credit, dec!(40000));
    }

    #[test]
    fn standard_ignores_records_older_than_four_most_recent() {
        let history = history(&[
            (2023, dec!(100000), dec!(1000000)),
            (2022, dec!(100000), dec!(1000000)),
            (2021, dec!(100000), dec!(1000000)),
            (2020, dec!(100000), dec!(1000000)),
            (2019, dec!(900000), dec!(1000000)),
        ]);

        let result = calculator().standard(2024, dec!(100000), &history);

        assert_eq!(result.avg_qre, dec!(100000));
        assert_eq!(result.base_percentage, dec!(0.10));
    }

    #[test]
    fn standard_lookback_spans_calendar_gaps() {
        let history = history(&[
            (2023, dec!(100000), dec!(1000000)),
            (2019, dec!(140000), dec!(1000000)),
        ]);

        let result = calculator().standard(2024, dec!(100000), &history);

        assert_eq!(result.avg_qre, dec!(120000));
        assert_eq!(result.base_percentage, dec!(0.12));
        assert_eq!(result.base_amount, dec!(120000));
        assert_eq!(result.missing_data, vec!["Only 2 of 4 base years have QRE data".to_string()]);
    }

    #[test]
    fn standard_incremental_is_never_negative() {
        let result = calculator().standard(2024, Decimal::ZERO, &HistoricalData::new());

        assert_eq!(result.incremental_qre, Decimal::ZERO);
        assert_eq!(result.credit, Decimal::ZERO);
    }

    #[test]
    fn standard_280c_reduces_by_corporate_rate() {
        let result = calculator_280c().standard(2024, dec!(100000), &HistoricalData::new());

        assert_eq!(result.credit, dec!(10000));
        assert_eq!(result.adjusted_credit, Some(dec!(7900)));
        assert_eq!(result.final_credit(), dec!(7900));
    }

    // =========================================================================
    // asc tests
    // =========================================================================

    #[test]
    fn asc_with_three_prior_years_uses_fourteen_percent() {
        let history = history(&[
            (2023, dec!(100000), Decimal::ZERO),
            (2022, dec!(120000), Decimal::ZERO),
            (2021, dec!(110000), Decimal::ZERO),
        ]);

        let result = calculator().asc(2024, dec!(200000), &history);

        assert_eq!(result.avg_prior_qre, dec!(110000));
        assert_eq!(result.incremental_qre, dec!(90000));
        assert_eq!(result.credit, dec!(12600));
        assert!(!result.is_startup);
        assert!(result.missing_data.is_empty());
    }

    #[test]
    fn asc_without_history_uses_startup_rate() {
        let _guard = init_test_tracing();

        let result = calculator().asc(2024, dec!(200000), &HistoricalData::new());

        assert_eq!(result.credit, dec!(12000));
        assert!(result.is_startup);
        assert_eq!(result.prior_years_used, 0);
        assert_eq!(result.missing_data.len(), 1);
    }

    #[test]
    fn asc_with_partial_history_reports_average_and_uses_startup_rate() {
        let _guard = init_test_tracing();
        let history = history(&[(2023, dec!(80000), Decimal::ZERO), (2022, dec!(60000), Decimal::ZERO)]);

        let result = calculator().asc(2024, dec!(200000), &history);

        assert_eq!(result.avg_prior_qre, dec!(70000));
        assert_eq!(result.incremental_qre, Decimal::ZERO);
        assert_eq!(result.credit, dec!(12000));
        assert!(result.is_startup);
        assert_eq!(result.missing_data, vec!["Using 2 prior year(s) for ASC calculation".to_string()]);
    }

    #[test]
    fn asc_skips_zero_qre_years_in_window() {
        let history = history(&[
            (2023, dec!(100000), Decimal::ZERO),
            (2022, Decimal::ZERO, Decimal::ZERO),
            (2021, dec!(110000), Decimal::ZERO),
            (2020, dec!(120000), Decimal::ZERO),
        ]);

        let result = calculator().asc(2024, dec!(200000), &history);

        assert_eq!(result.prior_years_used, 2);
        assert!(result.is_startup);
    }

    #[test]
    fn asc_uses_three_most_recent_records_across_gaps() {
        let history = history(&[
            (2023, dec!(100000), Decimal::ZERO),
            (2020, dec!(120000), Decimal::ZERO),
            (2019, dec!(110000), Decimal::ZERO),
        ]);

        let result = calculator().asc(2024, dec!(200000), &history);

        assert_eq!(result.prior_years_used, 3);
        assert!(!result.is_startup);
        assert_eq!(result.avg_prior_qre, dec!(110000));
        assert_eq!(result.credit, dec!(12600));
    }

    #[test]
    fn asc_clamps_when_qre_below_average() {
        let history = history(&[
            (2023, dec!(300000), Decimal::ZERO),
            (2022, dec!(300000), Decimal::ZERO),
            (2021, dec!(300000), Decimal::ZERO),
        ]);

        let result = calculator().asc(2024, dec!(100000), &history);

        assert_eq!(result.incremental_qre, Decimal::ZERO);
        assert_eq!(result.credit, Decimal::ZERO);
    }

    #[test]
    fn asc_280c_rounds_adjusted_credit() {
        let result = calculator_280c().asc(2024, dec!(200000), &HistoricalData::new());

        // 12,000 * 0.79 = 9,480
        assert_eq!(result.adjusted_credit, Some(dec!(9480)));
    }

    // =========================================================================
    // calculate tests
    // =========================================================================

    #[test]
    fn calculate_defaults_to_standard() {
        let results = calculator().calculate(2024, dec!(100000), &HistoricalData::new(), None);

        assert_eq!(results.selected_method, CreditMethod::Standard);
        assert_eq!(results.selected_credit(), dec!(10000));
    }

    #[test]
    fn calculate_honours_explicit_asc() {
        let results = calculator_280c().calculate(
            2024,
            dec!(200000),
            &HistoricalData::new(),
            Some(CreditMethod::Asc),
        );

        assert_eq!(results.selected_method, CreditMethod::Asc);
        assert_eq!(results.selected_credit(), dec!(9480));
        assert!(results.use_280c);
    }
}
