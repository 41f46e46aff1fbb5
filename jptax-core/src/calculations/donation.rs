//! Furusato-nozei donation limit: the amount deductible in full, the
//! donation ceiling including the self-paid portion, and the breakdown
//! into income tax and resident tax shares.
//!
//! The limit solves `special = cap` for the donation where the resident
//! tax special share hits its 20% ceiling:
//!
//! ```text
//! deductible = floor(resident income part x 20%)
//!            / (1 - income tax rate - 10%)
//! ```
//!
//! Because the shares round down independently, the recombined special
//! share can land just above the ceiling; the trace marks such results
//! NG instead of adjusting them.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::warn;

use crate::calculations::common::floor_yen;
use crate::calculations::recorder::TraceRecorder;
use crate::calculations::tax::TaxResult;
use crate::format::{format_percent, format_yen};
use crate::models::{Section, TaxInput, Term};

/// Ceiling of the resident tax special share, as a share of the
/// resident tax income part.
const SPECIAL_SHARE_CAP_RATE: Decimal = dec!(0.20);
/// Resident tax base share of the deductible amount.
const RESIDENT_BASE_RATE: Decimal = dec!(0.10);
/// Fixed self-paid portion of any donation.
const SELF_PAY: Decimal = dec!(2000);

#[derive(Debug, Clone, PartialEq)]
pub struct DonationResult {
    /// Donation amount deductible in full, before the self-paid portion.
    pub deductible_limit: Decimal,
    pub donation_limit: Decimal,
    /// Lowest of this estimate and the comparison site entries.
    pub adopted_limit: Decimal,
}

pub struct DonationCalculator<'a> {
    input: &'a TaxInput,
    tax: &'a TaxResult,
}

impl<'a> DonationCalculator<'a> {
    pub fn new(input: &'a TaxInput, tax: &'a TaxResult) -> Self {
        Self { input, tax }
    }

    pub fn calculate(&self, trace: &mut TraceRecorder) -> DonationResult {
        let rate = self.tax.income_tax_rate;
        let cap = floor_yen(self.tax.resident_income_part * SPECIAL_SHARE_CAP_RATE);
        let denominator = Decimal::ONE - rate - RESIDENT_BASE_RATE;
        let deductible_limit = if denominator > Decimal::ZERO {
            floor_yen(cap / denominator)
        } else {
            warn!(income_tax_rate = %rate, "donation limit denominator is not positive");
            Decimal::ZERO
        };

        let income_share = floor_yen(deductible_limit * rate);
        let resident_base = floor_yen(deductible_limit * RESIDENT_BASE_RATE);
        let special = deductible_limit - income_share - resident_base;
        let special_ok = special <= cap;

        trace
            .calc(Section::FurusatoLimit, "控除対象額（上限）")
            .expression("(住民税所得割額 × 20%) ÷ (1 − 所得税率 − 10%)")
            .term(Term::yen("住民税所得割額", self.tax.resident_income_part))
            .term(Term::pct(
                "住民税特例分 上限率",
                SPECIAL_SHARE_CAP_RATE,
                format_percent(SPECIAL_SHARE_CAP_RATE, 0),
            ))
            .term(Term::pct("所得税率", rate, format_percent(rate, 2)))
            .term(Term::pct(
                "住民税基本分率",
                RESIDENT_BASE_RATE,
                format_percent(RESIDENT_BASE_RATE, 0),
            ))
            .result(deductible_limit)
            .result_key("furusato.deductible.limit")
            .note(format!(
                "特例分 ≤ 所得割×20%: {}",
                if special_ok { "OK" } else { "NG" }
            ))
            .push();

        let donation_limit = deductible_limit + SELF_PAY;
        trace
            .calc(Section::FurusatoLimit, "寄付額上限")
            .expression("控除対象額 + 自己負担額")
            .term(Term::yen("控除対象額", deductible_limit).with_key("furusato.deductible.limit"))
            .term(Term::yen("自己負担額", SELF_PAY))
            .result(donation_limit)
            .result_key("furusato.donation.limit")
            .push();

        trace
            .calc(Section::FurusatoBreakdown, "所得税控除")
            .expression("控除対象額 × 所得税率")
            .term(Term::yen("控除対象額", deductible_limit))
            .term(Term::pct("所得税率", rate, format_percent(rate, 2)))
            .result(income_share)
            .result_key("furusato.breakdown.incomeTax")
            .push();
        trace
            .calc(Section::FurusatoBreakdown, "住民税基本分")
            .expression("控除対象額 × 10%")
            .term(Term::yen("控除対象額", deductible_limit))
            .term(Term::pct(
                "住民税基本分率",
                RESIDENT_BASE_RATE,
                format_percent(RESIDENT_BASE_RATE, 0),
            ))
            .result(resident_base)
            .result_key("furusato.breakdown.residentBase")
            .push();
        trace
            .calc(Section::FurusatoBreakdown, "住民税特例分")
            .expression("控除対象額 − 所得税控除 − 住民税基本分")
            .term(Term::yen("控除対象額", deductible_limit))
            .term(Term::yen("所得税控除", income_share))
            .term(Term::yen("住民税基本分", resident_base))
            .result(special)
            .result_key("furusato.breakdown.residentSpecial")
            .note(format!(
                "この金額は『住民税所得割額×20%』以下である必要があります（上限: {}）",
                format_yen(cap)
            ))
            .push();

        let adopted_limit = self.adopted_limit(trace, donation_limit);

        DonationResult {
            deductible_limit,
            donation_limit,
            adopted_limit,
        }
    }

    /// Adopts the lowest of this estimate and the entered comparison
    /// site limits. Zero site amounts count as not entered.
    fn adopted_limit(&self, trace: &mut TraceRecorder, donation_limit: Decimal) -> Decimal {
        let site_min = self
            .input
            .comparison_sites
            .iter()
            .filter(|site| site.amount > Decimal::ZERO)
            .map(|site| site.amount)
            .min();
        let adopted = match site_min {
            Some(minimum) => donation_limit.min(minimum),
            None => donation_limit,
        };

        let site_term = match site_min {
            Some(minimum) => Term::yen("サイト最小", minimum),
            None => Term::yen("サイト最小", Decimal::ZERO).with_display("未入力"),
        };
        trace
            .calc(Section::FurusatoLimit, "仲介サイト比較")
            .expression("min(サイト最小, 本アプリ)")
            .term(site_term)
            .term(Term::yen("本アプリ", donation_limit))
            .result(adopted)
            .result_key("furusato.adopted")
            .note("比較結果として、より低い上限額を採用します")
            .push();
        adopted
    }
}
