//! Display formatting for yen amounts, percentages, and counts.
//!
//! Amounts are truncated to whole yen and grouped with commas. The
//! minus sign goes before the currency mark ("-￥1,234").
//!
//! # Example
//!
//! ```
//! use jptax_core::format::{format_percent, format_yen};
//! use rust_decimal_macros::dec;
//!
//! assert_eq!(format_yen(dec!(1234567)), "￥1,234,567");
//! assert_eq!(format_percent(dec!(0.15), 2), "15.00%(0.15)");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Formats a whole-yen amount with thousands separators. Fractions are
/// truncated toward zero.
pub fn format_number(value: Decimal) -> String {
    let truncated = value.trunc();
    let negative = truncated.is_sign_negative() && !truncated.is_zero();
    let grouped = group_thousands(&truncated.abs().to_string());
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Formats an amount with the yen mark: `￥1,234` or `-￥1,234`.
pub fn format_yen(amount: Decimal) -> String {
    let number = format_number(amount);
    match number.strip_prefix('-') {
        Some(rest) => format!("-￥{rest}"),
        None => format!("￥{number}"),
    }
}

/// Formats a rate as a percentage with the raw rate in parentheses,
/// e.g. `15.00%(0.15)` at two digits of precision.
pub fn format_percent(rate: Decimal, precision: u32) -> String {
    let scaled = (rate * dec!(100))
        .round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}%({})", precision as usize, scaled, rate)
}

/// Percentage without the parenthesized rate, e.g. `7.71%` or `70%`.
pub fn format_percent_plain(rate: Decimal, precision: u32) -> String {
    let scaled = (rate * dec!(100))
        .round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}%", precision as usize, scaled)
}

fn group_thousands(digits: &str) -> String {
    let bytes = digits.as_bytes();
    let mut out = String::with_capacity(bytes.len() + bytes.len() / 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*b as char);
    }
    out
}
