//! Research-time allocation.
//!
//! An activity claims a share of the practice (`practice_percentage`). Each
//! selected subcomponent of the activity is worth
//!
//! ```text
//! applied = round(practice * frequency * time * year / 1_000_000)
//! ```
//!
//! percent of a participant's time. Deselected subcomponents are worth zero.
//! Employees carry their own copy of these percentages per year, which can
//! be re-split across subcomponents or edited one subcomponent at a time.
//!
//! | Operation | Capped | Source of frequency/time |
//! |-----------|--------|--------------------------|
//! | [`AllocationEngine::select_activity`] | yes | policy |
//! | [`AllocationEngine::copy_to_prior_years`] | yes | policy |
//! | [`ResearchActivity::set_practice_percentage`](crate::ResearchActivity::set_practice_percentage) | no | existing |
//! | [`ResearchActivity::recalculate`](crate::ResearchActivity::recalculate) | no | existing |

mod activity;
mod employee;
mod engine;
mod policy;

use rust_decimal::Decimal;
use thiserror::Error;

pub use engine::{
    APPLIED_PERCENTAGE_DIVISOR, AllocationEngine, GENERATED_YEAR_PERCENTAGE,
    MIN_PRIOR_YEAR_PRACTICE_PERCENTAGE, PRIOR_YEAR_REDUCTION_RATE, applied_percentage,
    reduced_practice_percentage, subcomponent_cap,
};
pub use policy::{
    DEFAULT_SEED, DefaultAllocationPolicy, FixedAllocationPolicy, GeneratedAllocation,
    SeededAllocationPolicy,
};

use crate::calculations::common::is_valid_percentage;

/// Errors raised by allocation edits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("{field} must be between 0 and 100, got {value}")]
    PercentageOutOfRange { field: &'static str, value: Decimal },

    #[error("activity {0} not found")]
    ActivityNotFound(String),

    #[error("subcomponent {subcomponent_id} not found in activity {activity_id}")]
    SubcomponentNotFound {
        activity_id: String,
        subcomponent_id: String,
    },

    #[error("no allocations recorded for {0}")]
    YearNotFound(i32),

    #[error("target year {target_year} is not before source year {source_year}")]
    NotAPriorYear { source_year: i32, target_year: i32 },
}

pub(crate) fn check_percentage(
    field: &'static str,
    value: Decimal,
) -> Result<Decimal, AllocationError> {
    if is_valid_percentage(value) {
        Ok(value)
    } else {
        Err(AllocationError::PercentageOutOfRange { field, value })
    }
}
