//! Whole-year calculation pipeline.
//!
//! `calculate_all` runs the stages in evaluation order, each appending
//! its audit lines to one shared trace:
//!
//! | Stage     | Produces                               |
//! |-----------|----------------------------------------|
//! | income    | salary, business, and stock income     |
//! | insurance | 社保 / 国保 / 国年 premiums            |
//! | deduction | income deductions for both taxes       |
//! | tax       | income tax, resident tax, separate tax |
//! | donation  | furusato-nozei limits                  |
//!
//! The run is pure: the same input always yields the same output, and
//! line ids restart at `line-1` on every invocation.
//!
//! # Example
//!
//! ```
//! use jptax_core::calculations::calculate_all;
//! use jptax_core::sample;
//! use rust_decimal_macros::dec;
//!
//! let output = calculate_all(&sample::empty_input(2024));
//!
//! // Nothing earned still owes the resident per-capita levy, and the
//! // donation limit is only the self-paid portion.
//! assert_eq!(output.summary.resident_tax_total, dec!(5000));
//! assert_eq!(output.summary.furusato_donation_limit, dec!(2000));
//! ```

use crate::calculations::deductions::DeductionCalculator;
use crate::calculations::donation::DonationCalculator;
use crate::calculations::income::IncomeAggregator;
use crate::calculations::insurance::{self, InsuranceEstimator};
use crate::calculations::recorder::TraceRecorder;
use crate::calculations::tax::TaxCalculator;
use crate::models::{Derived, EngineOutput, Summary, TaxInput};
use crate::rules;

/// Runs every calculation stage for one input and returns the full
/// audit trace plus the headline and derived figures.
pub fn calculate_all(input: &TaxInput) -> EngineOutput {
    let rule = rules::resolve(input.year);
    let mut trace = TraceRecorder::new();

    let income = IncomeAggregator::new(input, rule).calculate(&mut trace);
    let insurance_totals = InsuranceEstimator::new(input, rule, &income).calculate(&mut trace);
    let deductions =
        DeductionCalculator::new(input, rule, &income, &insurance_totals).calculate(&mut trace);
    let tax = TaxCalculator::new(input, rule, &income, &deductions).calculate(&mut trace);
    let donation = DonationCalculator::new(input, &tax).calculate(&mut trace);
    insurance::push_nhi_reduction_whatifs(&mut trace, insurance_totals.nhi_total);

    let summary = Summary {
        year: input.year,
        income_tax_total: tax.income_tax_total,
        resident_tax_total: tax.resident_total,
        separate_tax_stock: tax.separate_tax,
        social_insurance_deduction: insurance_totals.total,
        furusato_donation_limit: donation.donation_limit,
        adopted_limit: donation.adopted_limit,
    };
    let derived = Derived {
        taxable_income_general: tax.taxable_general,
        resident_income_part: tax.resident_income_part,
        income_tax_rate: tax.income_tax_rate,
        total_income_general: income.total_general,
        social_insurance_total: insurance_totals.total,
        nhi_total: insurance_totals.nhi_total,
        np_total: insurance_totals.np_total,
        np_months_pay: insurance_totals.np_months_pay,
        np_months_exempt: insurance_totals.np_months_exempt,
        furusato_donation_limit: donation.donation_limit,
    };

    EngineOutput {
        calc_lines: trace.into_lines(),
        summary,
        derived,
    }
}
