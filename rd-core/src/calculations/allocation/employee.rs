//! Per-employee allocation edits.
//!
//! An employee's year map mirrors the activity tree: one
//! [`ActivityAllocation`] per activity and one [`SubcomponentAllocation`]
//! per subcomponent. Activity totals always equal the sum of their selected
//! subcomponents after any edit here.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::{AllocationError, check_percentage};
use crate::{ActivityAllocation, Employee, ResearchActivity, SubcomponentAllocation};

impl Employee {
    /// Builds the year map from `activities`, replacing any years they cover.
    ///
    /// Every subcomponent starts selected at the activity's applied percentage,
    /// with the role description matching this employee's role.
    pub fn seed_allocations(
        &mut self,
        activities: &[ResearchActivity],
    ) {
        let mut seeded: BTreeMap<i32, Vec<ActivityAllocation>> = BTreeMap::new();
        for activity in activities {
            let subcomponents = activity
                .subcomponents
                .iter()
                .map(|sub| SubcomponentAllocation {
                    subcomponent_id: sub.id.clone(),
                    percentage: sub.applied_percentage,
                    is_selected: true,
                    role_description: sub.role_descriptions.for_role(self.role).map(str::to_string),
                })
                .collect();

            let mut allocation = ActivityAllocation {
                activity_id: activity.id.clone(),
                percentage: Decimal::ZERO,
                is_selected: true,
                subcomponents,
            };
            allocation.recompute_total();
            seeded.entry(activity.year).or_default().push(allocation);
        }
        self.yearly_activities.extend(seeded);
    }

    /// Splits `total` evenly across the activity's selected subcomponents.
    ///
    /// Shares are floored to the smallest decimal step of `total`; leftover
    /// steps go one each to the first selected subcomponents, so the shares
    /// always sum to `total`.
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use rust_decimal_macros::dec;
    /// use rd_core::{ActivityAllocation, Employee, EmployeeRole, SubcomponentAllocation};
    ///
    /// let sub = |id: &str| SubcomponentAllocation {
    ///     subcomponent_id: id.to_string(),
    ///     percentage: dec!(0),
    ///     is_selected: true,
    ///     role_description: None,
    /// };
    /// let mut employee = Employee {
    ///     id: "emp-1".to_string(),
    ///     name: "Sam Lee".to_string(),
    ///     role: EmployeeRole::Midlevel,
    ///     annual_wage: dec!(90000),
    ///     is_business_owner: false,
    ///     yearly_activities: BTreeMap::from([(
    ///         2024,
    ///         vec![ActivityAllocation {
    ///             activity_id: "act-1".to_string(),
    ///             percentage: dec!(0),
    ///             is_selected: true,
    ///             subcomponents: vec![sub("a"), sub("b"), sub("c")],
    ///         }],
    ///     )]),
    /// };
    ///
    /// employee.redistribute_activity_percentage(2024, "act-1", dec!(10)).unwrap();
    ///
    /// let shares: Vec<_> = employee.activities_for(2024)[0]
    ///     .subcomponents
    ///     .iter()
    ///     .map(|s| s.percentage)
    ///     .collect();
    /// assert_eq!(shares, vec![dec!(4), dec!(3), dec!(3)]);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError`] for an out-of-range total or unknown year/activity.
    pub fn redistribute_activity_percentage(
        &mut self,
        year: i32,
        activity_id: &str,
        total: Decimal,
    ) -> Result<(), AllocationError> {
        let total = check_percentage("activity percentage", total)?;
        let allocation = self.allocation_mut(year, activity_id)?;

        let selected = allocation.subcomponents.iter().filter(|s| s.is_selected).count();
        if selected == 0 {
            warn!(
                activity_id,
                year,
                total = %total,
                "No selected subcomponents; activity percentage cannot be distributed"
            );
            allocation.recompute_total();
            return Ok(());
        }

        let unit = Decimal::new(1, total.scale());
        let units = total / unit;
        let count = Decimal::from(selected);
        let share = (units / count).floor();
        let mut remainder = units - share * count;

        for sub in allocation.subcomponents.iter_mut().filter(|s| s.is_selected) {
            let extra = if remainder > Decimal::ZERO {
                remainder -= Decimal::ONE;
                Decimal::ONE
            } else {
                Decimal::ZERO
            };
            sub.percentage = (share + extra) * unit;
        }
        allocation.recompute_total();

        debug!(
            activity_id,
            year,
            total = %allocation.percentage,
            "Redistributed activity percentage"
        );
        Ok(())
    }

    /// Sets one subcomponent's share; the activity total follows, uncapped.
    pub fn set_subcomponent_percentage(
        &mut self,
        year: i32,
        activity_id: &str,
        subcomponent_id: &str,
        percentage: Decimal,
    ) -> Result<(), AllocationError> {
        let percentage = check_percentage("subcomponent percentage", percentage)?;
        let allocation = self.allocation_mut(year, activity_id)?;
        subcomponent_mut(allocation, subcomponent_id)?.percentage = percentage;
        allocation.recompute_total();
        Ok(())
    }

    /// Flips an activity's selection and returns the new state.
    pub fn toggle_activity(
        &mut self,
        year: i32,
        activity_id: &str,
    ) -> Result<bool, AllocationError> {
        let allocation = self.allocation_mut(year, activity_id)?;
        allocation.is_selected = !allocation.is_selected;
        allocation.recompute_total();
        Ok(allocation.is_selected)
    }

    /// Flips a subcomponent's selection and returns the new state.
    pub fn toggle_subcomponent(
        &mut self,
        year: i32,
        activity_id: &str,
        subcomponent_id: &str,
    ) -> Result<bool, AllocationError> {
        let allocation = self.allocation_mut(year, activity_id)?;
        let sub = subcomponent_mut(allocation, subcomponent_id)?;
        sub.is_selected = !sub.is_selected;
        let selected = sub.is_selected;
        allocation.recompute_total();
        Ok(selected)
    }

    pub fn set_role_description(
        &mut self,
        year: i32,
        activity_id: &str,
        subcomponent_id: &str,
        description: impl Into<String>,
    ) -> Result<(), AllocationError> {
        let allocation = self.allocation_mut(year, activity_id)?;
        subcomponent_mut(allocation, subcomponent_id)?.role_description = Some(description.into());
        Ok(())
    }

    /// Re-derives subcomponent percentages from the activities' applied percentages.
    ///
    /// All percentages are reset first; then, for every activity/subcomponent
    /// pair selected on both the activity and the employee, the activity's
    /// applied percentage is copied over and the activity total recomputed.
    pub fn sync_with_activities(
        &mut self,
        activities: &[ResearchActivity],
    ) {
        for allocation in self.yearly_activities.values_mut().flatten() {
            allocation.percentage = Decimal::ZERO;
            for sub in &mut allocation.subcomponents {
                sub.percentage = Decimal::ZERO;
            }
        }

        for activity in activities {
            let Some(allocation) = self.activity_mut(activity.year, &activity.id) else {
                continue;
            };
            if !allocation.is_selected {
                continue;
            }
            for sub in activity.selected_subcomponents() {
                if let Some(target) = allocation.subcomponent_mut(&sub.id)
                    && target.is_selected
                {
                    target.percentage = sub.applied_percentage;
                }
            }
            allocation.recompute_total();
        }
    }

    /// Replaces `to_year`'s allocations with a copy of `from_year`'s.
    pub fn copy_allocations_to_year(
        &mut self,
        from_year: i32,
        to_year: i32,
    ) -> Result<(), AllocationError> {
        let source = self
            .yearly_activities
            .get(&from_year)
            .cloned()
            .ok_or(AllocationError::YearNotFound(from_year))?;
        self.yearly_activities.insert(to_year, source);
        Ok(())
    }

    fn allocation_mut(
        &mut self,
        year: i32,
        activity_id: &str,
    ) -> Result<&mut ActivityAllocation, AllocationError> {
        self.yearly_activities
            .get_mut(&year)
            .ok_or(AllocationError::YearNotFound(year))?
            .iter_mut()
            .find(|a| a.activity_id == activity_id)
            .ok_or_else(|| AllocationError::ActivityNotFound(activity_id.to_string()))
    }
}

fn subcomponent_mut<'a>(
    allocation: &'a mut ActivityAllocation,
    subcomponent_id: &str,
) -> Result<&'a mut SubcomponentAllocation, AllocationError> {
    let activity_id = allocation.activity_id.clone();
    allocation
        .subcomponent_mut(subcomponent_id)
        .ok_or_else(|| AllocationError::SubcomponentNotFound {
            activity_id,
            subcomponent_id: subcomponent_id.to_string(),
        })
}
