//! Single entry point composing the calculation stages.
//!
//! ```text
//! snapshot ─► allocation ─► QRE ─► federal ─► state ─► summary
//! ```
//!
//! The engine reads only the snapshot it is given and returns a fresh
//! [`CreditReport`]; running it twice on the same snapshot yields identical
//! reports.

use std::borrow::Cow;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{info, warn};

use crate::calculations::common::round_to_dollar;
use crate::calculations::federal::{ASC_LOOKBACK_YEARS, STANDARD_LOOKBACK_YEARS};
use crate::calculations::{
    CalculationConfig, CalculationConfigError, CreditCalculationResult, CreditSummarizer,
    FederalCreditCalculator, FederalCreditResults, QreAggregation, QreAggregator,
    StateCreditCalculation, StateCreditCalculator, StateCreditInputs,
};
use crate::{CreditCalculationInput, CreditMethod, EntityType, ResearchActivity};

const ASC_STATE_BASE_FRACTION: Decimal = dec!(0.5);

/// Everything computed for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreditReport {
    pub business_id: Option<String>,
    pub year: i32,
    pub entity_type: EntityType,
    pub result: CreditCalculationResult,
    pub qre: QreAggregation,
    pub federal: FederalCreditResults,
    pub state: StateCreditCalculation,
    /// Advisory findings that did not change the numbers.
    pub notes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CreditEngine {
    config: CalculationConfig,
}

impl CreditEngine {
    pub fn new(config: CalculationConfig) -> Self {
        Self { config }
    }

    /// Engine configured from the rates carried on the snapshot.
    pub fn from_input(input: &CreditCalculationInput) -> Self {
        Self::new(CalculationConfig::from_input(input))
    }

    pub fn config(&self) -> &CalculationConfig {
        &self.config
    }

    /// Runs every stage for `input`.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationConfigError`] if the configuration is invalid.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use rd_core::{CreditCalculationInput, CreditEngine, EntityType, QreBreakdown};
    ///
    /// let mut input = CreditCalculationInput::new(2024, EntityType::CCorp, "TX");
    /// input.locked_qre = Some(QreBreakdown::new(dec!(100000), dec!(0), dec!(0)));
    ///
    /// let report = CreditEngine::from_input(&input).calculate(&input).unwrap();
    ///
    /// assert_eq!(report.result.standard_credit, dec!(10000));
    /// // Texas: 5% of QRE above the 50,000 standard base
    /// assert_eq!(report.result.state_credit, dec!(2500));
    /// assert_eq!(report.result.total_credit, dec!(12500));
    /// ```
    pub fn calculate(
        &self,
        input: &CreditCalculationInput,
    ) -> Result<CreditReport, CalculationConfigError> {
        self.config.validate()?;

        let activities = normalized_activities(&input.selected_activities);
        let notes = self.allocation_notes(input.year, &activities);

        let employees = if input.sync_employee_allocations {
            let mut synced = input.employees.clone();
            for employee in &mut synced {
                employee.sync_with_activities(&activities);
            }
            Cow::Owned(synced)
        } else {
            Cow::Borrowed(input.employees.as_slice())
        };

        let qre = QreAggregator::new(self.config.clone()).aggregate(
            input.year,
            &employees,
            &input.contractor_expenses,
            &input.supply_expenses,
            input.locked_qre.as_ref(),
        );
        let total_qre = qre.breakdown.total;

        let federal = FederalCreditCalculator::new(self.config.clone(), input.use_280c).calculate(
            input.year,
            total_qre,
            &input.historical_data,
            input.selected_method,
        );

        let state_inputs = self.state_inputs(input, total_qre, &federal);
        let state = StateCreditCalculator::new(input.include_state_credit).calculate(
            &input.state_code,
            input.entity_type,
            state_inputs,
        );

        let result = CreditSummarizer::summarize(total_qre, &federal, &state);
        info!(
            year = input.year,
            total_qre = %result.total_qre,
            method = result.selected_method.as_str(),
            federal = %result.federal_credit_adjusted,
            state = %result.state_credit,
            total = %result.total_credit,
            "Credit calculation complete"
        );

        Ok(CreditReport {
            business_id: input.business_id.clone(),
            year: input.year,
            entity_type: input.entity_type,
            result,
            qre,
            federal,
            state,
            notes,
        })
    }

    /// Flags activities whose selected subcomponents claim more than the practice share.
    fn allocation_notes(
        &self,
        year: i32,
        activities: &[ResearchActivity],
    ) -> Vec<String> {
        activities
            .iter()
            .filter(|activity| activity.year == year && activity.exceeds_practice_percentage())
            .map(|activity| {
                let applied = activity.total_applied_percentage();
                warn!(
                    activity_id = %activity.id,
                    applied = %applied,
                    practice_percentage = %activity.practice_percentage,
                    "Activity allocation exceeds practice percentage"
                );
                format!(
                    "Activity {} allocates {}% against a practice percentage of {}%",
                    activity.name, applied, activity.practice_percentage
                )
            })
            .collect()
    }

    /// Derives the state formula inputs from the snapshot and federal results.
    fn state_inputs(
        &self,
        input: &CreditCalculationInput,
        total_qre: Decimal,
        federal: &FederalCreditResults,
    ) -> StateCreditInputs {
        let history = &input.historical_data;
        let avg_prior_qres = round_to_dollar(history.average_prior_qre(input.year, ASC_LOOKBACK_YEARS));

        let base_amount = match federal.selected_method {
            CreditMethod::Standard => federal.standard.base_amount,
            CreditMethod::Asc => round_to_dollar(ASC_STATE_BASE_FRACTION * avg_prior_qres),
        };

        StateCreditInputs {
            qre: total_qre,
            prior_year_qre: history.prior_year_qre(input.year),
            avg_prior_qres,
            avg_gross_receipts: round_to_dollar(
                history.average_prior_gross_receipts(input.year, STANDARD_LOOKBACK_YEARS),
            ),
            base_amount,
            federal_credit: federal.selected_credit(),
            basic_research_payments: input.basic_research_payments,
            num_employees: u32::try_from(input.employees.len()).unwrap_or(u32::MAX),
        }
    }
}

/// Snapshot activities with deselected subcomponents zeroed and missing
/// applied percentages derived.
fn normalized_activities(activities: &[ResearchActivity]) -> Vec<ResearchActivity> {
    activities
        .iter()
        .cloned()
        .map(|mut activity| {
            activity.normalize_applied();
            activity
        })
        .collect()
}
