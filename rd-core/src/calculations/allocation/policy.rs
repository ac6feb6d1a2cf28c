use std::ops::RangeInclusive;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Seed used by [`SeededAllocationPolicy::default`].
pub const DEFAULT_SEED: u64 = 42;

const FREQUENCY_RANGE: RangeInclusive<u32> = 20..=50;
const TIME_RANGE: RangeInclusive<u32> = 4..=10;

/// Frequency and time percentages for a newly generated subcomponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedAllocation {
    pub frequency_percentage: Decimal,
    pub time_percentage: Decimal,
}

/// Source of default frequency/time values for newly selected subcomponents.
///
/// Implementations must return a frequency in `[20, 50]` and a time in
/// `[4, 10]`, both whole percents.
pub trait DefaultAllocationPolicy {
    fn generate(
        &mut self,
        activity_id: &str,
        subcomponent_id: &str,
    ) -> GeneratedAllocation;
}

/// Draws defaults from a seeded ChaCha8 stream, so runs are reproducible.
#[derive(Debug, Clone)]
pub struct SeededAllocationPolicy {
    rng: ChaCha8Rng,
}

impl SeededAllocationPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Default for SeededAllocationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl DefaultAllocationPolicy for SeededAllocationPolicy {
    fn generate(
        &mut self,
        _activity_id: &str,
        _subcomponent_id: &str,
    ) -> GeneratedAllocation {
        let frequency = self.rng.gen_range(FREQUENCY_RANGE);
        let time = self.rng.gen_range(TIME_RANGE);
        GeneratedAllocation {
            frequency_percentage: Decimal::from(frequency),
            time_percentage: Decimal::from(time),
        }
    }
}

/// Hands out the same values for every subcomponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedAllocationPolicy {
    pub frequency_percentage: Decimal,
    pub time_percentage: Decimal,
}

impl Default for FixedAllocationPolicy {
    fn default() -> Self {
        Self {
            frequency_percentage: dec!(35),
            time_percentage: dec!(7),
        }
    }
}

impl DefaultAllocationPolicy for FixedAllocationPolicy {
    fn generate(
        &mut self,
        _activity_id: &str,
        _subcomponent_id: &str,
    ) -> GeneratedAllocation {
        GeneratedAllocation {
            frequency_percentage: self.frequency_percentage,
            time_percentage: self.time_percentage,
        }
    }
}
