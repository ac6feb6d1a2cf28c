//! Common utility functions for credit calculations.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a value to a whole unit using half-up rounding.
///
/// Used for every dollar amount the engine reports and for applied
/// allocation percentages, which are whole percents.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use rd_core::calculations::common::round_to_dollar;
///
/// assert_eq!(round_to_dollar(dec!(12600.49)), dec!(12600));
/// assert_eq!(round_to_dollar(dec!(12600.50)), dec!(12601));
/// assert_eq!(round_to_dollar(dec!(-0.5)), dec!(-1)); // Away from zero
/// ```
pub fn round_to_dollar(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps a value at zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use rd_core::calculations::common::non_negative;
///
/// assert_eq!(non_negative(dec!(-250)), dec!(0));
/// assert_eq!(non_negative(dec!(250)), dec!(250));
/// ```
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Returns `percentage` percent of `amount`.
pub fn percent_of(
    amount: Decimal,
    percentage: Decimal,
) -> Decimal {
    amount * percentage / Decimal::ONE_HUNDRED
}

/// True when `value` lies in the closed interval `[0, 100]`.
pub fn is_valid_percentage(value: Decimal) -> bool {
    value >= Decimal::ZERO && value <= Decimal::ONE_HUNDRED
}

/// True when `value` lies in the closed interval `[0, 1]`.
pub fn is_valid_rate(value: Decimal) -> bool {
    value >= Decimal::ZERO && value <= Decimal::ONE
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_to_dollar tests
    // =========================================================================

    #[test]
    fn round_to_dollar_rounds_down_below_midpoint() {
        assert_eq!(round_to_dollar(dec!(674999.49)), dec!(674999));
    }

    #[test]
    fn round_to_dollar_rounds_up_at_midpoint() {
        assert_eq!(round_to_dollar(dec!(2.5)), dec!(3));
    }

    #[test]
    fn round_to_dollar_rounds_negative_midpoint_away_from_zero() {
        assert_eq!(round_to_dollar(dec!(-2.5)), dec!(-3));
    }

    #[test]
    fn round_to_dollar_keeps_whole_values() {
        assert_eq!(round_to_dollar(dec!(10000)), dec!(10000));
    }

    // =========================================================================
    // non_negative tests
    // =========================================================================

    #[test]
    fn non_negative_clamps_negative_to_zero() {
        assert_eq!(non_negative(dec!(-0.01)), Decimal::ZERO);
    }

    #[test]
    fn non_negative_passes_zero_through() {
        assert_eq!(non_negative(Decimal::ZERO), Decimal::ZERO);
    }

    // =========================================================================
    // percent_of tests
    // =========================================================================

    #[test]
    fn percent_of_scales_by_hundred() {
        assert_eq!(percent_of(dec!(80000), dec!(25)), dec!(20000));
    }

    // =========================================================================
    // range check tests
    // =========================================================================

    #[test]
    fn percentage_bounds_are_inclusive() {
        assert!(is_valid_percentage(dec!(0)));
        assert!(is_valid_percentage(dec!(100)));
        assert!(!is_valid_percentage(dec!(100.01)));
        assert!(!is_valid_percentage(dec!(-1)));
    }

    #[test]
    fn rate_bounds_are_inclusive() {
        assert!(is_valid_rate(dec!(0)));
        assert!(is_valid_rate(dec!(1)));
        assert!(!is_valid_rate(dec!(1.01)));
    }
}
