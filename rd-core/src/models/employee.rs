use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmployeeRole {
    #[serde(rename = "Research Leader")]
    ResearchLeader,
    Clinician,
    Midlevel,
    #[serde(rename = "Clinical Assistant")]
    ClinicalAssistant,
}

impl EmployeeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResearchLeader => "Research Leader",
            Self::Clinician => "Clinician",
            Self::Midlevel => "Midlevel",
            Self::ClinicalAssistant => "Clinical Assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Research Leader" => Some(Self::ResearchLeader),
            "Clinician" => Some(Self::Clinician),
            "Midlevel" => Some(Self::Midlevel),
            "Clinical Assistant" => Some(Self::ClinicalAssistant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcomponentAllocation {
    pub subcomponent_id: String,
    #[serde(default)]
    pub percentage: Decimal,
    #[serde(default)]
    pub is_selected: bool,
    #[serde(default)]
    pub role_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityAllocation {
    pub activity_id: String,
    #[serde(default)]
    pub percentage: Decimal,
    #[serde(default)]
    pub is_selected: bool,
    #[serde(default)]
    pub subcomponents: Vec<SubcomponentAllocation>,
}

impl ActivityAllocation {
    pub fn subcomponent_mut(
        &mut self,
        subcomponent_id: &str,
    ) -> Option<&mut SubcomponentAllocation> {
        self.subcomponents
            .iter_mut()
            .find(|s| s.subcomponent_id == subcomponent_id)
    }

    /// Sum of percentages over selected subcomponents.
    pub fn selected_percentage(&self) -> Decimal {
        self.subcomponents
            .iter()
            .filter(|s| s.is_selected)
            .map(|s| s.percentage)
            .sum()
    }

    /// Resets the activity total to the sum of its selected subcomponents.
    pub fn recompute_total(&mut self) {
        self.percentage = self.selected_percentage();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub role: EmployeeRole,
    pub annual_wage: Decimal,
    #[serde(default)]
    pub is_business_owner: bool,
    #[serde(default)]
    pub yearly_activities: BTreeMap<i32, Vec<ActivityAllocation>>,
}

impl Employee {
    pub fn activities_for(
        &self,
        year: i32,
    ) -> &[ActivityAllocation] {
        self.yearly_activities
            .get(&year)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn activity_mut(
        &mut self,
        year: i32,
        activity_id: &str,
    ) -> Option<&mut ActivityAllocation> {
        self.yearly_activities
            .get_mut(&year)?
            .iter_mut()
            .find(|a| a.activity_id == activity_id)
    }

    /// Share of the employee's time spent on qualified research in `year`.
    ///
    /// Only selected subcomponents of selected activities count.
    pub fn total_applied_percentage(
        &self,
        year: i32,
    ) -> Decimal {
        self.activities_for(year)
            .iter()
            .filter(|a| a.is_selected)
            .map(ActivityAllocation::selected_percentage)
            .sum()
    }

    /// Unrounded wage QRE for `year`.
    pub fn qualified_wages(
        &self,
        year: i32,
    ) -> Decimal {
        self.annual_wage * self.total_applied_percentage(year) / Decimal::ONE_HUNDRED
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn sub(
        id: &str,
        percentage: Decimal,
        is_selected: bool,
    ) -> SubcomponentAllocation {
        SubcomponentAllocation {
            subcomponent_id: id.to_string(),
            percentage,
            is_selected,
            role_description: None,
        }
    }

    fn employee() -> Employee {
        let mut yearly_activities = BTreeMap::new();
        yearly_activities.insert(
            2024,
            vec![
                ActivityAllocation {
                    activity_id: "act-1".to_string(),
                    percentage: dec!(30),
                    is_selected: true,
                    subcomponents: vec![
                        sub("sub-1", dec!(20), true),
                        sub("sub-2", dec!(10), true),
                        sub("sub-3", dec!(15), false),
                    ],
                },
                ActivityAllocation {
                    activity_id: "act-2".to_string(),
                    percentage: dec!(25),
                    is_selected: false,
                    subcomponents: vec![sub("sub-4", dec!(25), true)],
                },
            ],
        );

        Employee {
            id: "emp-1".to_string(),
            name: "Dana Ortiz".to_string(),
            role: EmployeeRole::Clinician,
            annual_wage: dec!(150000),
            is_business_owner: false,
            yearly_activities,
        }
    }

    #[test]
    fn total_applied_percentage_counts_selected_pairs_only() {
        assert_eq!(employee().total_applied_percentage(2024), dec!(30));
    }

    #[test]
    fn total_applied_percentage_is_zero_for_missing_year() {
        assert_eq!(employee().total_applied_percentage(2019), Decimal::ZERO);
    }

    #[test]
    fn qualified_wages_applies_percentage_to_annual_wage() {
        assert_eq!(employee().qualified_wages(2024), dec!(45000));
    }

    #[test]
    fn recompute_total_sums_selected_subcomponents() {
        let mut allocation = employee().yearly_activities[&2024][0].clone();
        allocation.percentage = dec!(99);

        allocation.recompute_total();

        assert_eq!(allocation.percentage, dec!(30));
    }

    #[test]
    fn role_uses_display_names() {
        let json = serde_json::to_string(&EmployeeRole::ResearchLeader).unwrap();

        assert_eq!(json, "\"Research Leader\"");
        assert_eq!(
            EmployeeRole::parse("Clinical Assistant"),
            Some(EmployeeRole::ClinicalAssistant)
        );
        assert_eq!(EmployeeRole::parse("Owner"), None);
    }
}
