use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{
    ContractorExpense, Employee, EntityType, HistoricalData, QreBreakdown, ResearchActivity,
    SupplyExpense,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditMethod {
    Standard,
    Asc,
}

impl CreditMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Asc => "asc",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Some(Self::Standard),
            "asc" => Some(Self::Asc),
            _ => None,
        }
    }
}

impl fmt::Display for CreditMethod {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("Standard"),
            Self::Asc => f.write_str("ASC"),
        }
    }
}

fn default_corporate_tax_rate() -> Decimal {
    dec!(0.21)
}

fn default_contractor_qualified_rate() -> Decimal {
    Decimal::ONE
}

fn default_true() -> bool {
    true
}

/// Immutable snapshot of everything the engine needs for one business and year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCalculationInput {
    #[serde(default)]
    pub business_id: Option<String>,
    pub year: i32,
    pub entity_type: EntityType,
    pub state_code: String,
    #[serde(default)]
    pub selected_activities: Vec<ResearchActivity>,
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub contractor_expenses: Vec<ContractorExpense>,
    #[serde(default)]
    pub supply_expenses: Vec<SupplyExpense>,
    #[serde(default)]
    pub historical_data: HistoricalData,
    #[serde(default)]
    pub selected_method: Option<CreditMethod>,
    #[serde(default)]
    pub use_280c: bool,
    #[serde(default = "default_corporate_tax_rate")]
    pub corporate_tax_rate: Decimal,
    #[serde(default = "default_true")]
    pub include_state_credit: bool,
    #[serde(default)]
    pub basic_research_payments: Decimal,
    #[serde(default = "default_contractor_qualified_rate")]
    pub contractor_qualified_rate: Decimal,
    #[serde(default)]
    pub apply_eighty_percent_rule: bool,
    /// Re-derive employee subcomponent percentages from the activities first.
    #[serde(default)]
    pub sync_employee_allocations: bool,
    #[serde(default)]
    pub locked_qre: Option<QreBreakdown>,
}

impl CreditCalculationInput {
    /// A snapshot with no allocations, expenses or history and default settings.
    pub fn new(
        year: i32,
        entity_type: EntityType,
        state_code: impl Into<String>,
    ) -> Self {
        Self {
            business_id: None,
            year,
            entity_type,
            state_code: state_code.into(),
            selected_activities: Vec::new(),
            employees: Vec::new(),
            contractor_expenses: Vec::new(),
            supply_expenses: Vec::new(),
            historical_data: HistoricalData::new(),
            selected_method: None,
            use_280c: false,
            corporate_tax_rate: default_corporate_tax_rate(),
            include_state_credit: true,
            basic_research_payments: Decimal::ZERO,
            contractor_qualified_rate: default_contractor_qualified_rate(),
            apply_eighty_percent_rule: false,
            sync_employee_allocations: false,
            locked_qre: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn minimal_snapshot_takes_documented_defaults() {
        let json = r#"{"year": 2024, "entity_type": "c_corp", "state_code": "CA"}"#;

        let input: CreditCalculationInput = serde_json::from_str(json).unwrap();

        assert_eq!(input, CreditCalculationInput::new(2024, EntityType::CCorp, "CA"));
        assert_eq!(input.corporate_tax_rate, dec!(0.21));
        assert_eq!(input.contractor_qualified_rate, dec!(1));
        assert!(input.include_state_credit);
    }

    #[test]
    fn credit_method_parses_case_insensitively() {
        assert_eq!(CreditMethod::parse("ASC"), Some(CreditMethod::Asc));
        assert_eq!(CreditMethod::parse("standard"), Some(CreditMethod::Standard));
        assert_eq!(CreditMethod::parse("regular"), None);
    }

    #[test]
    fn selected_method_deserializes_lowercase() {
        let json = r#"{"year": 2024, "entity_type": "llc", "state_code": "TX", "selected_method": "asc"}"#;

        let input: CreditCalculationInput = serde_json::from_str(json).unwrap();

        assert_eq!(input.selected_method, Some(CreditMethod::Asc));
    }
}
