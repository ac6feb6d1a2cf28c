use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractorType {
    Individual,
    Company,
}

impl ContractorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Company => "company",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "individual" => Some(Self::Individual),
            "company" => Some(Self::Company),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractorExpense {
    pub id: String,
    pub year: i32,
    pub amount: Decimal,
    pub research_percentage: Decimal,
    #[serde(default)]
    pub subcomponent_id: Option<String>,
    pub contractor_name: String,
    #[serde(default)]
    pub role: Option<String>,
    pub contractor_type: ContractorType,
}

impl ContractorExpense {
    /// Research share of the payment, before any qualified-rate haircut.
    pub fn research_amount(&self) -> Decimal {
        self.amount * self.research_percentage / Decimal::ONE_HUNDRED
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyExpense {
    pub id: String,
    pub year: i32,
    pub amount: Decimal,
    pub research_percentage: Decimal,
    #[serde(default)]
    pub subcomponent_id: Option<String>,
    pub supplier_name: String,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
}

impl SupplyExpense {
    pub fn research_amount(&self) -> Decimal {
        self.amount * self.research_percentage / Decimal::ONE_HUNDRED
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn contractor_research_amount_is_unrounded() {
        let expense = ContractorExpense {
            id: "c-1".to_string(),
            year: 2024,
            amount: dec!(10001),
            research_percentage: dec!(33),
            subcomponent_id: None,
            contractor_name: "Lab Partners LLC".to_string(),
            role: None,
            contractor_type: ContractorType::Company,
        };

        assert_eq!(expense.research_amount(), dec!(3300.33));
    }

    #[test]
    fn supply_research_amount_applies_percentage() {
        let expense = SupplyExpense {
            id: "s-1".to_string(),
            year: 2024,
            amount: dec!(2500),
            research_percentage: dec!(40),
            subcomponent_id: Some("sub-1".to_string()),
            supplier_name: "Henry Schein".to_string(),
            vendor: None,
            category: Some("consumables".to_string()),
            quantity: Some(dec!(12)),
        };

        assert_eq!(expense.research_amount(), dec!(1000));
    }

    #[test]
    fn contractor_type_parse_ignores_case() {
        assert_eq!(ContractorType::parse("Company"), Some(ContractorType::Company));
        assert_eq!(ContractorType::parse("individual"), Some(ContractorType::Individual));
        assert_eq!(ContractorType::parse("agency"), None);
    }
}
