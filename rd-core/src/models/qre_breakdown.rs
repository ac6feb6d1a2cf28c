use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whole-dollar QRE per category for one tax year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QreBreakdown {
    pub employee_wages: Decimal,
    pub contractor_costs: Decimal,
    pub supply_costs: Decimal,
    pub total: Decimal,
}

impl QreBreakdown {
    pub fn new(
        employee_wages: Decimal,
        contractor_costs: Decimal,
        supply_costs: Decimal,
    ) -> Self {
        Self {
            employee_wages,
            contractor_costs,
            supply_costs,
            total: employee_wages + contractor_costs + supply_costs,
        }
    }
}
