use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::EmployeeRole;

fn default_true() -> bool {
    true
}

/// Default role descriptions a subcomponent offers to the staff assigned to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleDescriptions {
    pub research_leader: Option<String>,
    pub clinician: Option<String>,
    pub midlevel: Option<String>,
    pub clinical_assistant: Option<String>,
    pub general: Option<String>,
}

impl RoleDescriptions {
    /// Description for `role`, falling back to the general description.
    pub fn for_role(
        &self,
        role: EmployeeRole,
    ) -> Option<&str> {
        let specific = match role {
            EmployeeRole::ResearchLeader => &self.research_leader,
            EmployeeRole::Clinician => &self.clinician,
            EmployeeRole::Midlevel => &self.midlevel,
            EmployeeRole::ClinicalAssistant => &self.clinical_assistant,
        };
        specific.as_deref().or(self.general.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchSubcomponent {
    pub id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub is_selected: bool,
    #[serde(default)]
    pub frequency_percentage: Decimal,
    #[serde(default)]
    pub time_percentage: Decimal,
    #[serde(default)]
    pub year_percentage: Decimal,
    #[serde(default)]
    pub applied_percentage: Decimal,
    #[serde(default)]
    pub role_descriptions: RoleDescriptions,
}

impl ResearchSubcomponent {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_selected: true,
            frequency_percentage: Decimal::ZERO,
            time_percentage: Decimal::ZERO,
            year_percentage: Decimal::ZERO,
            applied_percentage: Decimal::ZERO,
            role_descriptions: RoleDescriptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchActivity {
    pub id: String,
    pub name: String,
    pub practice_percentage: Decimal,
    pub year: i32,
    #[serde(default)]
    pub subcomponents: Vec<ResearchSubcomponent>,
}

impl ResearchActivity {
    pub fn subcomponent(
        &self,
        subcomponent_id: &str,
    ) -> Option<&ResearchSubcomponent> {
        self.subcomponents.iter().find(|s| s.id == subcomponent_id)
    }

    pub fn subcomponent_mut(
        &mut self,
        subcomponent_id: &str,
    ) -> Option<&mut ResearchSubcomponent> {
        self.subcomponents.iter_mut().find(|s| s.id == subcomponent_id)
    }

    pub fn selected_subcomponents(&self) -> impl Iterator<Item = &ResearchSubcomponent> {
        self.subcomponents.iter().filter(|s| s.is_selected)
    }

    pub fn selected_count(&self) -> usize {
        self.selected_subcomponents().count()
    }

    /// Sum of applied percentages over selected subcomponents.
    pub fn total_applied_percentage(&self) -> Decimal {
        self.selected_subcomponents().map(|s| s.applied_percentage).sum()
    }

    /// True when the selected subcomponents claim more than the practice share.
    ///
    /// This is advisory: over-allocated activities are still accepted.
    pub fn exceeds_practice_percentage(&self) -> bool {
        self.total_applied_percentage() > self.practice_percentage
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn activity() -> ResearchActivity {
        let mut first = ResearchSubcomponent::new("sub-1", "Protocol design");
        first.applied_percentage = dec!(12);
        let mut second = ResearchSubcomponent::new("sub-2", "Data collection");
        second.applied_percentage = dec!(9);
        let mut third = ResearchSubcomponent::new("sub-3", "Outcome review");
        third.applied_percentage = dec!(30);
        third.is_selected = false;

        ResearchActivity {
            id: "act-1".to_string(),
            name: "Implant workflow".to_string(),
            practice_percentage: dec!(20),
            year: 2024,
            subcomponents: vec![first, second, third],
        }
    }

    #[test]
    fn total_applied_percentage_ignores_deselected_subcomponents() {
        assert_eq!(activity().total_applied_percentage(), dec!(21));
        assert_eq!(activity().selected_count(), 2);
    }

    #[test]
    fn exceeds_practice_percentage_flags_over_allocation() {
        assert!(activity().exceeds_practice_percentage());

        let mut within = activity();
        within.practice_percentage = dec!(21);
        assert!(!within.exceeds_practice_percentage());
    }

    #[test]
    fn role_description_falls_back_to_general() {
        let descriptions = RoleDescriptions {
            clinician: Some("Performs the procedure".to_string()),
            general: Some("Participates in the study".to_string()),
            ..RoleDescriptions::default()
        };

        assert_eq!(
            descriptions.for_role(EmployeeRole::Clinician),
            Some("Performs the procedure")
        );
        assert_eq!(
            descriptions.for_role(EmployeeRole::Midlevel),
            Some("Participates in the study")
        );
        assert_eq!(RoleDescriptions::default().for_role(EmployeeRole::Midlevel), None);
    }

    #[test]
    fn subcomponent_defaults_to_selected_when_deserialized() {
        let json = r#"{"id": "sub-9", "name": "Imaging"}"#;

        let sub: ResearchSubcomponent = serde_json::from_str(json).unwrap();

        assert!(sub.is_selected);
        assert_eq!(sub.applied_percentage, Decimal::ZERO);
    }
}
