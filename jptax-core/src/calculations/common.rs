//! Shared rounding and bracket helpers.
//!
//! | Function              | Behavior                                    |
//! |-----------------------|---------------------------------------------|
//! | `round_yen`           | Round to whole yen, halves away from zero   |
//! | `floor_yen`           | Round down toward negative infinity         |
//! | `floor_to_thousand`   | Drop the amount below the next 1,000 yen    |
//! | `prorate_round`       | Scale an annual amount by months over 12    |
//! | `pick_bracket_value`  | First matching row of a deduction ladder    |
//!
//! # Example
//!
//! ```
//! use jptax_core::calculations::common::{floor_to_thousand, round_yen};
//! use rust_decimal_macros::dec;
//!
//! assert_eq!(round_yen(dec!(118677.5)), dec!(118678));
//! assert_eq!(floor_to_thousand(dec!(3081999)), dec!(3081000));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::models::BasicDeductionBracket;

/// Rounds to whole yen, halves away from zero.
pub fn round_yen(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds down toward negative infinity.
pub fn floor_yen(value: Decimal) -> Decimal {
    value.floor()
}

/// Drops the portion below 1,000 yen. Taxable income amounts are
/// truncated this way before a rate is applied.
pub fn floor_to_thousand(value: Decimal) -> Decimal {
    (value / dec!(1000)).floor() * dec!(1000)
}

/// Scales an annual amount to a month count and rounds to whole yen.
pub fn prorate_round(annual: Decimal, months: u32) -> Decimal {
    round_yen(annual * Decimal::from(months) / dec!(12))
}

/// Walks a deduction ladder top down and returns the first row whose
/// bound covers `income`. A `None` bound matches everything. An empty
/// table yields zero.
pub fn pick_bracket_value(income: Decimal, brackets: &[BasicDeductionBracket]) -> Decimal {
    brackets
        .iter()
        .find(|bracket| bracket.max_income.map_or(true, |max| income <= max))
        .map(|bracket| bracket.deduction)
        .unwrap_or(Decimal::ZERO)
}
