//! Decimal helpers for the fill ledger and execution reports.
//!
//! Schedule math runs in `f64`; everything that touches cash goes through
//! `Decimal`. These helpers sit on that boundary.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Convert a schedule value to `Decimal`. Non-finite input maps to zero.
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// Convert a ledger value back to `f64` for schedule-side comparisons.
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Round a decimal to a specific number of decimal places.
pub fn round_to_precision(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp(decimals)
}

/// Safe division that returns zero if divisor is zero.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator == Decimal::ZERO {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// Weighted average of `(value, weight)` pairs; zero when there is no weight.
pub fn weighted_average(values: &[(Decimal, Decimal)]) -> Decimal {
    let (sum, weight_sum) = values.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(sum, weight_sum), (val, weight)| (sum + val * weight, weight_sum + weight),
    );

    safe_div(sum, weight_sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_f64_boundary() {
        assert_eq!(to_decimal(1500.25), dec!(1500.25));
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
        assert_eq!(to_f64(dec!(-42.5)), -42.5);
    }

    #[test]
    fn test_safe_div() {
        assert_eq!(safe_div(dec!(10), dec!(4)), dec!(2.5));
        assert_eq!(safe_div(dec!(10), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_weighted_average_fill_price() {
        // 10 shares at 100, 5 shares at 106
        let fills = vec![(dec!(100), dec!(10)), (dec!(106), dec!(5))];
        assert_eq!(weighted_average(&fills), dec!(102));
        assert_eq!(weighted_average(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_round_to_precision() {
        assert_eq!(round_to_precision(dec!(1.23456), 2), dec!(1.23));
    }
}
