//! Qualified Research Expense aggregation.
//!
//! Converts allocation percentages and expense records into whole-dollar QRE
//! per category for one tax year:
//!
//! | Category | Formula |
//! |----------|---------|
//! | Wages | Σ `annual_wage * percentage / 100` over selected activity/subcomponent pairs |
//! | Contractors | Σ `amount * research_percentage / 100 * contractor_qualified_rate` |
//! | Supplies | Σ `amount * research_percentage / 100` |
//!
//! Each category is summed exactly and rounded once; the total is the sum of
//! the rounded categories.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calculations::CalculationConfig;
use crate::calculations::common::{percent_of, round_to_dollar};
use crate::{ContractorExpense, Employee, QreBreakdown, SupplyExpense};

const EIGHTY_PERCENT_THRESHOLD: Decimal = dec!(80);

/// Derived per-employee figures for the calculation year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeQre {
    pub employee_id: String,
    pub name: String,
    pub total_applied_percentage: Decimal,
    /// Percentage actually applied to wages, after the eighty-percent rule.
    pub counted_percentage: Decimal,
    pub qualified_wages: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QreAggregation {
    pub year: i32,
    pub breakdown: QreBreakdown,
    pub employees: Vec<EmployeeQre>,
    /// True when a locked breakdown replaced the computed one.
    pub locked: bool,
    pub calculation_details: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct QreAggregator {
    config: CalculationConfig,
}

impl QreAggregator {
    pub fn new(config: CalculationConfig) -> Self {
        Self { config }
    }

    /// Aggregates QRE for `year`.
    ///
    /// When `locked` is given, its categories are reported verbatim and the
    /// per-employee rows are still derived for reference.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use rd_core::calculations::{CalculationConfig, QreAggregator};
    /// use rd_core::{ContractorExpense, ContractorType};
    ///
    /// let contractor = ContractorExpense {
    ///     id: "c-1".to_string(),
    ///     year: 2024,
    ///     amount: dec!(20000),
    ///     research_percentage: dec!(50),
    ///     subcomponent_id: None,
    ///     contractor_name: "Bench Labs".to_string(),
    ///     role: None,
    ///     contractor_type: ContractorType::Company,
    /// };
    /// let config = CalculationConfig {
    ///     contractor_qualified_rate: dec!(0.65),
    ///     ..CalculationConfig::default()
    /// };
    ///
    /// let result = QreAggregator::new(config).aggregate(2024, &[], &[contractor], &[], None);
    ///
    /// assert_eq!(result.breakdown.contractor_costs, dec!(6500));
    /// assert_eq!(result.breakdown.total, dec!(6500));
    /// ```
    pub fn aggregate(
        &self,
        year: i32,
        employees: &[Employee],
        contractors: &[ContractorExpense],
        supplies: &[SupplyExpense],
        locked: Option<&QreBreakdown>,
    ) -> QreAggregation {
        let mut details = Vec::new();

        let rows = self.employee_rows(year, employees);
        let wages = round_to_dollar(rows.iter().map(|r| r.qualified_wages).sum());
        let contractor_costs = self.contractor_qre(year, contractors, &mut details);
        let supply_costs = self.supply_qre(year, supplies, &mut details);

        let computed = QreBreakdown::new(wages, contractor_costs, supply_costs);
        details.push(format!(
            "Wages ${} + contractors ${} + supplies ${} = ${}",
            computed.employee_wages,
            computed.contractor_costs,
            computed.supply_costs,
            computed.total
        ));

        let breakdown = match locked {
            Some(locked) => {
                info!(year, total = %locked.total, "Using locked QRE values");
                details.push(format!(
                    "Locked QRE values used: total ${} (computed ${})",
                    locked.employee_wages + locked.contractor_costs + locked.supply_costs,
                    computed.total
                ));
                QreBreakdown::new(
                    locked.employee_wages,
                    locked.contractor_costs,
                    locked.supply_costs,
                )
            }
            None => computed,
        };

        debug!(
            year,
            wages = %breakdown.employee_wages,
            contractors = %breakdown.contractor_costs,
            supplies = %breakdown.supply_costs,
            total = %breakdown.total,
            "Aggregated QRE"
        );

        QreAggregation {
            year,
            breakdown,
            employees: rows,
            locked: locked.is_some(),
            calculation_details: details,
        }
    }

    fn employee_rows(
        &self,
        year: i32,
        employees: &[Employee],
    ) -> Vec<EmployeeQre> {
        employees
            .iter()
            .map(|employee| {
                let total = employee.total_applied_percentage(year);
                let counted = self.counted_percentage(total);
                EmployeeQre {
                    employee_id: employee.id.clone(),
                    name: employee.name.clone(),
                    total_applied_percentage: total,
                    counted_percentage: counted,
                    qualified_wages: percent_of(employee.annual_wage, counted),
                }
            })
            .collect()
    }

    fn contractor_qre(
        &self,
        year: i32,
        contractors: &[ContractorExpense],
        details: &mut Vec<String>,
    ) -> Decimal {
        let rate = self.config.contractor_qualified_rate;
        let sum: Decimal = contractors
            .iter()
            .filter(|c| c.year == year)
            .map(|c| {
                let research = if self.counts_in_full(c.research_percentage) {
                    c.amount
                } else {
                    c.research_amount()
                };
                research * rate
            })
            .sum();
        if rate != Decimal::ONE {
            details.push(format!("Contractor payments counted at {rate} of research share"));
        }
        round_to_dollar(sum)
    }

    fn supply_qre(
        &self,
        year: i32,
        supplies: &[SupplyExpense],
        details: &mut Vec<String>,
    ) -> Decimal {
        let in_year: Vec<&SupplyExpense> = supplies.iter().filter(|s| s.year == year).collect();
        let skipped = supplies.len() - in_year.len();
        if skipped > 0 {
            details.push(format!("{skipped} supply expense(s) outside {year} ignored"));
        }
        round_to_dollar(in_year.iter().map(|s| s.research_amount()).sum())
    }

    fn counts_in_full(
        &self,
        percentage: Decimal,
    ) -> bool {
        self.config.apply_eighty_percent_rule && percentage >= EIGHTY_PERCENT_THRESHOLD
    }

    /// Applies the eighty-percent rule when enabled.
    fn counted_percentage(
        &self,
        percentage: Decimal,
    ) -> Decimal {
        if self.counts_in_full(percentage) {
            Decimal::ONE_HUNDRED
        } else {
            percentage
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{ActivityAllocation, ContractorType, EmployeeRole, SubcomponentAllocation};

    fn employee(
        id: &str,
        wage: Decimal,
        percentages: &[(Decimal, bool)],
    ) -> Employee {
        let subcomponents = percentages
            .iter()
            .enumerate()
            .map(|(i, &(percentage, is_selected))| SubcomponentAllocation {
                subcomponent_id: format!("sub-{i}"),
                percentage,
                is_selected,
                role_description: None,
            })
            .collect();
        let mut allocation = ActivityAllocation {
            activity_id: "act-1".to_string(),
            percentage: Decimal::ZERO,
            is_selected: true,
            subcomponents,
        };
        allocation.recompute_total();

        Employee {
            id: id.to_string(),
            name: id.to_string(),
            role: EmployeeRole::Clinician,
            annual_wage: wage,
            is_business_owner: false,
            yearly_activities: BTreeMap::from([(2024, vec![allocation])]),
        }
    }

    fn contractor(
        year: i32,
        amount: Decimal,
        research_percentage: Decimal,
    ) -> ContractorExpense {
        ContractorExpense {
            id: format!("c-{year}-{amount}"),
            year,
            amount,
            research_percentage,
            subcomponent_id: None,
            contractor_name: "Contract Lab".to_string(),
            role: Some("Technician".to_string()),
            contractor_type: ContractorType::Individual,
        }
    }

    fn supply(
        year: i32,
        amount: Decimal,
        research_percentage: Decimal,
    ) -> SupplyExpense {
        SupplyExpense {
            id: format!("s-{year}-{amount}"),
            year,
            amount,
            research_percentage,
            subcomponent_id: None,
            supplier_name: "Dental Depot".to_string(),
            vendor: None,
            category: None,
            quantity: None,
        }
    }

    fn aggregator() -> QreAggregator {
        QreAggregator::new(CalculationConfig::default())
    }

    // =========================================================================
    // wage tests
    // =========================================================================

    #[test]
    fn wages_sum_selected_subcomponents_only() {
        let staff = [employee("emp-1", dec!(100000), &[(dec!(10), true), (dec!(15), false)])];

        let result = aggregator().aggregate(2024, &staff, &[], &[], None);

        assert_eq!(result.breakdown.employee_wages, dec!(10000));
        assert_eq!(result.employees[0].total_applied_percentage, dec!(10));
    }

    #[test]
    fn wages_round_only_after_summing() {
        // 0.5 + 0.5 = 1.0; rounding each first would give 2
        let staff = [
            employee("emp-1", dec!(50), &[(dec!(1), true)]),
            employee("emp-2", dec!(50), &[(dec!(1), true)]),
        ];

        let result = aggregator().aggregate(2024, &staff, &[], &[], None);

        assert_eq!(result.breakdown.employee_wages, dec!(1));
    }

    #[test]
    fn wages_ignore_other_years() {
        let staff = [employee("emp-1", dec!(100000), &[(dec!(10), true)])];

        let result = aggregator().aggregate(2023, &staff, &[], &[], None);

        assert_eq!(result.breakdown.employee_wages, Decimal::ZERO);
    }

    #[test]
    fn eighty_percent_rule_counts_full_wage_when_enabled() {
        let staff = [employee("emp-1", dec!(120000), &[(dec!(50), true), (dec!(32), true)])];
        let enabled = QreAggregator::new(CalculationConfig {
            apply_eighty_percent_rule: true,
            ..CalculationConfig::default()
        });

        let with_rule = enabled.aggregate(2024, &staff, &[], &[], None);
        let without_rule = aggregator().aggregate(2024, &staff, &[], &[], None);

        assert_eq!(with_rule.breakdown.employee_wages, dec!(120000));
        assert_eq!(with_rule.employees[0].counted_percentage, dec!(100));
        assert_eq!(without_rule.breakdown.employee_wages, dec!(98400));
    }

    // =========================================================================
    // contractor and supply tests
    // =========================================================================

    #[test]
    fn contractors_default_to_full_rate() {
        let contractors = [contractor(2024, dec!(30000), dec!(40)), contractor(2023, dec!(99999), dec!(100))];

        let result = aggregator().aggregate(2024, &[], &contractors, &[], None);

        assert_eq!(result.breakdown.contractor_costs, dec!(12000));
    }

    #[test]
    fn eighty_percent_rule_applies_to_contractors() {
        let contractors = [contractor(2024, dec!(10000), dec!(85))];
        let enabled = QreAggregator::new(CalculationConfig {
            apply_eighty_percent_rule: true,
            ..CalculationConfig::default()
        });

        let result = enabled.aggregate(2024, &[], &contractors, &[], None);

        assert_eq!(result.breakdown.contractor_costs, dec!(10000));
    }

    #[test]
    fn supplies_filter_by_year() {
        let supplies = [supply(2024, dec!(4000), dec!(25)), supply(2022, dec!(4000), dec!(25))];

        let result = aggregator().aggregate(2024, &[], &[], &supplies, None);

        assert_eq!(result.breakdown.supply_costs, dec!(1000));
        assert!(result.calculation_details.iter().any(|d| d.contains("outside 2024")));
    }

    #[test]
    fn total_is_sum_of_rounded_categories() {
        let staff = [employee("emp-1", dec!(1001), &[(dec!(50), true)])];
        let contractors = [contractor(2024, dec!(1001), dec!(50))];
        let supplies = [supply(2024, dec!(1001), dec!(50))];

        let result = aggregator().aggregate(2024, &staff, &contractors, &supplies, None);

        // 500.5 rounds to 501 in each category
        assert_eq!(result.breakdown, QreBreakdown::new(dec!(501), dec!(501), dec!(501)));
        assert_eq!(result.breakdown.total, dec!(1503));
    }

    // =========================================================================
    // locked QRE tests
    // =========================================================================

    #[test]
    fn locked_breakdown_is_used_verbatim() {
        let staff = [employee("emp-1", dec!(100000), &[(dec!(10), true)])];
        let locked = QreBreakdown::new(dec!(250000), dec!(0), dec!(5000));

        let result = aggregator().aggregate(2024, &staff, &[], &[], Some(&locked));

        assert!(result.locked);
        assert_eq!(result.breakdown, locked);
        assert_eq!(result.employees[0].qualified_wages, dec!(10000));
        assert!(result.calculation_details.iter().any(|d| d.starts_with("Locked QRE")));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let staff = [employee("emp-1", dec!(87500), &[(dec!(13), true), (dec!(7), true)])];
        let supplies = [supply(2024, dec!(1234.56), dec!(33))];

        let first = aggregator().aggregate(2024, &staff, &[], &supplies, None);
        let second = aggregator().aggregate(2024, &staff, &[], &supplies, None);

        assert_eq!(first, second);
    }
}
