use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use super::{AllocationError, DefaultAllocationPolicy, check_percentage};
use crate::ResearchActivity;
use crate::calculations::common::round_to_dollar;

/// Divisor turning the product of four percentages into a percentage.
pub const APPLIED_PERCENTAGE_DIVISOR: Decimal = dec!(1000000);

/// Year percentage assigned to generated subcomponents.
pub const GENERATED_YEAR_PERCENTAGE: Decimal = dec!(100);

/// Practice percentage lost per year when copying an activity backwards.
pub const PRIOR_YEAR_REDUCTION_RATE: Decimal = dec!(0.05);

/// Floor applied after each prior-year reduction step.
pub const MIN_PRIOR_YEAR_PRACTICE_PERCENTAGE: Decimal = dec!(4);

/// Applied percentage of a subcomponent, rounded to a whole percent.
///
/// ```
/// use rust_decimal_macros::dec;
/// use rd_core::calculations::allocation::applied_percentage;
///
/// // 40% of practice, 50% frequency, 60% time, all year
/// assert_eq!(applied_percentage(dec!(40), dec!(50), dec!(60), dec!(100)), dec!(12));
/// ```
pub fn applied_percentage(
    practice_percentage: Decimal,
    frequency_percentage: Decimal,
    time_percentage: Decimal,
    year_percentage: Decimal,
) -> Decimal {
    round_to_dollar(raw_applied_percentage(
        practice_percentage,
        frequency_percentage,
        time_percentage,
        year_percentage,
    ))
}

fn raw_applied_percentage(
    practice_percentage: Decimal,
    frequency_percentage: Decimal,
    time_percentage: Decimal,
    year_percentage: Decimal,
) -> Decimal {
    practice_percentage * frequency_percentage * time_percentage * year_percentage
        / APPLIED_PERCENTAGE_DIVISOR
}

/// Even share of the practice percentage per selected subcomponent.
///
/// Returns `None` when nothing is selected.
pub fn subcomponent_cap(
    practice_percentage: Decimal,
    selected_count: usize,
) -> Option<Decimal> {
    if selected_count == 0 {
        return None;
    }
    Some(practice_percentage / Decimal::from(selected_count))
}

/// Practice percentage after stepping `years_back` years into the past.
///
/// Each step removes `round(p * 5%)` and floors the result at 4.
///
/// ```
/// use rust_decimal_macros::dec;
/// use rd_core::calculations::allocation::reduced_practice_percentage;
///
/// assert_eq!(reduced_practice_percentage(dec!(40), 1), dec!(38));
/// assert_eq!(reduced_practice_percentage(dec!(40), 2), dec!(36));
/// assert_eq!(reduced_practice_percentage(dec!(3), 1), dec!(4));
/// ```
pub fn reduced_practice_percentage(
    practice_percentage: Decimal,
    years_back: u32,
) -> Decimal {
    (0..years_back).fold(practice_percentage, |current, _| {
        let reduction = round_to_dollar(current * PRIOR_YEAR_REDUCTION_RATE);
        (current - reduction).max(MIN_PRIOR_YEAR_PRACTICE_PERCENTAGE)
    })
}

/// Generates subcomponent allocations for newly selected activities.
///
/// Frequency and time come from the injected policy; generated values are
/// capped at an even share of the practice percentage per selected
/// subcomponent.
///
/// ```
/// use rust_decimal_macros::dec;
/// use rd_core::{ResearchActivity, ResearchSubcomponent};
/// use rd_core::calculations::allocation::{AllocationEngine, FixedAllocationPolicy};
///
/// let template = ResearchActivity {
///     id: "act-1".to_string(),
///     name: "Guided surgery".to_string(),
///     practice_percentage: dec!(0),
///     year: 2024,
///     subcomponents: vec![
///         ResearchSubcomponent::new("sub-1", "Planning"),
///         ResearchSubcomponent::new("sub-2", "Fabrication"),
///     ],
/// };
///
/// let mut engine = AllocationEngine::new(FixedAllocationPolicy::default());
/// let activity = engine.select_activity(&template, dec!(40), 2024).unwrap();
///
/// // 40 * 35 * 7 * 100 / 1e6 = 0.98, under the cap of 20
/// assert_eq!(activity.subcomponents[0].applied_percentage, dec!(1));
/// ```
#[derive(Debug, Clone)]
pub struct AllocationEngine<P> {
    policy: P,
}

impl<P: DefaultAllocationPolicy> AllocationEngine<P> {
    pub fn new(policy: P) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Creates a year-specific copy of `template` with generated allocations.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::PercentageOutOfRange`] if
    /// `practice_percentage` is outside `[0, 100]`.
    pub fn select_activity(
        &mut self,
        template: &ResearchActivity,
        practice_percentage: Decimal,
        year: i32,
    ) -> Result<ResearchActivity, AllocationError> {
        let practice_percentage = check_percentage("practice_percentage", practice_percentage)?;

        let mut activity = template.clone();
        activity.practice_percentage = practice_percentage;
        activity.year = year;
        self.generate(&mut activity);
        Ok(activity)
    }

    /// Copies the `source_year` activities into each of `target_years`.
    ///
    /// Practice percentages shrink by one reduction step per calendar year
    /// back and frequency/time are regenerated, so the copy is lossy. Only
    /// the copies are returned.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::NotAPriorYear`] if any target is not
    /// strictly before `source_year`.
    pub fn copy_to_prior_years(
        &mut self,
        activities: &[ResearchActivity],
        source_year: i32,
        target_years: &[i32],
    ) -> Result<Vec<ResearchActivity>, AllocationError> {
        if let Some(&target) = target_years.iter().find(|&&y| y >= source_year) {
            return Err(AllocationError::NotAPriorYear {
                source_year,
                target_year: target,
            });
        }

        let sources: Vec<&ResearchActivity> =
            activities.iter().filter(|a| a.year == source_year).collect();
        if sources.is_empty() {
            warn!(source_year, "No activities recorded for source year; nothing to copy");
            return Ok(Vec::new());
        }

        let mut copies = Vec::with_capacity(sources.len() * target_years.len());
        for &target in target_years {
            let years_back = source_year.abs_diff(target);
            for source in &sources {
                let mut copy = (*source).clone();
                copy.year = target;
                copy.practice_percentage =
                    reduced_practice_percentage(source.practice_percentage, years_back);
                self.generate(&mut copy);
                debug!(
                    activity_id = %copy.id,
                    year = target,
                    practice_percentage = %copy.practice_percentage,
                    "Copied activity to prior year"
                );
                copies.push(copy);
            }
        }
        Ok(copies)
    }

    /// Fills frequency/time/year for selected subcomponents and caps the result.
    fn generate(
        &mut self,
        activity: &mut ResearchActivity,
    ) {
        let practice = activity.practice_percentage;
        let cap = subcomponent_cap(practice, activity.selected_count());

        for sub in &mut activity.subcomponents {
            let Some(cap) = cap.filter(|_| sub.is_selected) else {
                sub.applied_percentage = Decimal::ZERO;
                continue;
            };

            let generated = self.policy.generate(&activity.id, &sub.id);
            sub.frequency_percentage = generated.frequency_percentage;
            sub.time_percentage = generated.time_percentage;
            sub.year_percentage = GENERATED_YEAR_PERCENTAGE;

            let raw = raw_applied_percentage(
                practice,
                sub.frequency_percentage,
                sub.time_percentage,
                sub.year_percentage,
            );
            sub.applied_percentage = round_to_dollar(raw.min(cap));
        }
    }
}
