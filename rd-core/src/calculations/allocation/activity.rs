//! In-place edits of an activity's subcomponent percentages.
//!
//! Edits recompute applied percentages without the generation cap; the
//! result may exceed the practice percentage, which callers can detect with
//! [`ResearchActivity::exceeds_practice_percentage`].

use rust_decimal::Decimal;

use super::{AllocationError, applied_percentage, check_percentage};
use crate::{ResearchActivity, ResearchSubcomponent};

impl ResearchActivity {
    /// Recomputes every subcomponent's applied percentage.
    pub fn recalculate(&mut self) {
        let practice = self.practice_percentage;
        for sub in &mut self.subcomponents {
            sub.applied_percentage = applied_for(practice, sub);
        }
    }

    /// Zeroes deselected subcomponents and derives applied percentages that
    /// were never filled in.
    ///
    /// A stored non-zero applied percentage on a selected subcomponent is
    /// kept, since it may carry the generation cap.
    pub fn normalize_applied(&mut self) {
        let practice = self.practice_percentage;
        for sub in &mut self.subcomponents {
            if !sub.is_selected || sub.applied_percentage.is_zero() {
                sub.applied_percentage = applied_for(practice, sub);
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`AllocationError::PercentageOutOfRange`] for values outside `[0, 100]`.
    pub fn set_practice_percentage(
        &mut self,
        practice_percentage: Decimal,
    ) -> Result<(), AllocationError> {
        self.practice_percentage = check_percentage("practice_percentage", practice_percentage)?;
        self.recalculate();
        Ok(())
    }

    pub fn set_frequency_percentage(
        &mut self,
        subcomponent_id: &str,
        percentage: Decimal,
    ) -> Result<(), AllocationError> {
        let percentage = check_percentage("frequency_percentage", percentage)?;
        self.edit_subcomponent(subcomponent_id, |sub| sub.frequency_percentage = percentage)
    }

    pub fn set_time_percentage(
        &mut self,
        subcomponent_id: &str,
        percentage: Decimal,
    ) -> Result<(), AllocationError> {
        let percentage = check_percentage("time_percentage", percentage)?;
        self.edit_subcomponent(subcomponent_id, |sub| sub.time_percentage = percentage)
    }

    pub fn set_year_percentage(
        &mut self,
        subcomponent_id: &str,
        percentage: Decimal,
    ) -> Result<(), AllocationError> {
        let percentage = check_percentage("year_percentage", percentage)?;
        self.edit_subcomponent(subcomponent_id, |sub| sub.year_percentage = percentage)
    }

    /// Flips a subcomponent's selection and returns the new state.
    pub fn toggle_subcomponent(
        &mut self,
        subcomponent_id: &str,
    ) -> Result<bool, AllocationError> {
        let mut selected = false;
        self.edit_subcomponent(subcomponent_id, |sub| {
            sub.is_selected = !sub.is_selected;
            selected = sub.is_selected;
        })?;
        Ok(selected)
    }

    fn edit_subcomponent(
        &mut self,
        subcomponent_id: &str,
        edit: impl FnOnce(&mut ResearchSubcomponent),
    ) -> Result<(), AllocationError> {
        let practice = self.practice_percentage;
        let activity_id = self.id.clone();
        let sub = self.subcomponent_mut(subcomponent_id).ok_or_else(|| {
            AllocationError::SubcomponentNotFound {
                activity_id,
                subcomponent_id: subcomponent_id.to_string(),
            }
        })?;
        edit(sub);
        sub.applied_percentage = applied_for(practice, sub);
        Ok(())
    }
}

fn applied_for(
    practice_percentage: Decimal,
    sub: &ResearchSubcomponent,
) -> Decimal {
    if !sub.is_selected {
        return Decimal::ZERO;
    }
    applied_percentage(
        practice_percentage,
        sub.frequency_percentage,
        sub.time_percentage,
        sub.year_percentage,
    )
}
