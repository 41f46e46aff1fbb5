//! Income deductions: basic, social insurance, contribution plans,
//! life and earthquake insurance, and medical expenses.
//!
//! Life insurance and earthquake insurance produce different amounts
//! for income tax and resident tax, so both figures are kept. The
//! `total_national` sum feeds the income tax base; the resident tax
//! side rebuilds its own total from the per-tax amounts.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::calculations::common::{floor_yen, pick_bracket_value};
use crate::calculations::income::IncomeBreakdown;
use crate::calculations::insurance::InsuranceTotals;
use crate::calculations::recorder::TraceRecorder;
use crate::format::format_number;
use crate::models::{LifeInsuranceRegimeRule, RuleYear, Section, TaxInput, Term};

/// Deduction amounts, split per tax where the statutes differ.
#[derive(Debug, Clone, PartialEq)]
pub struct DeductionTotals {
    pub basic_national: Decimal,
    pub social_insurance: Decimal,
    pub ideco: Decimal,
    pub small_biz: Decimal,
    pub safety: Decimal,
    pub life_national: Decimal,
    pub life_local: Decimal,
    pub earthquake_national: Decimal,
    pub earthquake_local: Decimal,
    pub medical: Decimal,
    /// Income tax deduction total.
    pub total_national: Decimal,
}

pub struct DeductionCalculator<'a> {
    input: &'a TaxInput,
    rule: &'a RuleYear,
    income: &'a IncomeBreakdown,
    insurance: &'a InsuranceTotals,
}

impl<'a> DeductionCalculator<'a> {
    pub fn new(
        input: &'a TaxInput,
        rule: &'a RuleYear,
        income: &'a IncomeBreakdown,
        insurance: &'a InsuranceTotals,
    ) -> Self {
        Self {
            input,
            rule,
            income,
            insurance,
        }
    }

    pub fn calculate(&self, trace: &mut TraceRecorder) -> DeductionTotals {
        let basic_national = self.basic(trace);
        let social_insurance = self.social_insurance(trace);
        let (ideco, small_biz, safety) = self.contribution_plans(trace);
        let (life_national, life_local) = self.life_insurance(trace);
        let (earthquake_national, earthquake_local) = self.earthquake(trace);
        let medical = self.medical(trace);

        let total_national = basic_national
            + social_insurance
            + ideco
            + small_biz
            + safety
            + medical
            + life_national
            + earthquake_national;
        trace
            .calc(Section::Deduction, "所得控除合計")
            .expression("基礎 + 社会保険料 + 掛金系 + 医療 + 生命保険 + 地震")
            .term(Term::yen("基礎控除", basic_national))
            .term(Term::yen("社会保険料控除", social_insurance))
            .term(Term::yen("iDeCo掛金", ideco))
            .term(Term::yen("小規模企業共済掛金", small_biz))
            .term(Term::yen("経営セーフティ共済掛金", safety))
            .term(Term::yen("医療費控除", medical))
            .term(Term::yen("生命保険料控除（所得税）", life_national))
            .term(Term::yen("地震保険料控除（所得税）", earthquake_national))
            .result(total_national)
            .result_key("deduction.total")
            .push();

        DeductionTotals {
            basic_national,
            social_insurance,
            ideco,
            small_biz,
            safety,
            life_national,
            life_local,
            earthquake_national,
            earthquake_local,
            medical,
            total_national,
        }
    }

    /// Basic deduction, stepped down by total income.
    fn basic(&self, trace: &mut TraceRecorder) -> Decimal {
        let amount = pick_bracket_value(
            self.income.total_general,
            &self.rule.income_tax.basic_deduction.brackets,
        );
        trace
            .calc(Section::Deduction, "基礎控除")
            .expression("年度ルール（合計所得金額により段階制）")
            .term(Term::yen("合計所得金額", self.income.total_general))
            .result(amount)
            .result_key("deduction.basic")
            .push();
        amount
    }

    fn social_insurance(&self, trace: &mut TraceRecorder) -> Decimal {
        let total = self.insurance.total;
        trace
            .calc(Section::Deduction, "社会保険料控除（合計）")
            .expression("社保 + 国保 + 国年")
            .term(Term::yen("社保", self.insurance.si_total))
            .term(Term::yen("国保", self.insurance.nhi_total))
            .term(Term::yen("国年", self.insurance.np_total))
            .result(total)
            .result_key("deduction.socialInsurance.total")
            .push();
        total
    }

    /// Contribution plans deducted at face value.
    fn contribution_plans(&self, trace: &mut TraceRecorder) -> (Decimal, Decimal, Decimal) {
        let deductions = &self.input.deductions;
        let plans = [
            ("iDeCo掛金", "deduction.ideco", deductions.ideco),
            (
                "小規模企業共済掛金",
                "deduction.smallBizMutualAid",
                deductions.small_biz_mutual_aid,
            ),
            (
                "経営セーフティ共済掛金",
                "deduction.safetyMutualAid",
                deductions.safety_mutual_aid,
            ),
        ];
        for (title, key, amount) in plans {
            trace
                .calc(Section::Deduction, title)
                .expression("入力値")
                .result(amount)
                .result_key(key)
                .push();
        }
        (
            deductions.ideco,
            deductions.small_biz_mutual_aid,
            deductions.safety_mutual_aid,
        )
    }

    /// Three premium categories per regime, then the capped sums.
    fn life_insurance(&self, trace: &mut TraceRecorder) -> (Decimal, Decimal) {
        let paid = &self.input.deductions.life_insurance;
        let categories = [
            ("一般", "general", paid.general),
            ("介護医療", "nursingMedical", paid.nursing_medical),
            ("個人年金", "pension", paid.pension),
        ];
        let national_rule = &self.rule.life_insurance_deduction.national;
        let local_rule = &self.rule.life_insurance_deduction.local;

        let national_amounts =
            life_category_lines(trace, &categories, national_rule, "所得税", "incomeTax");
        let local_amounts =
            life_category_lines(trace, &categories, local_rule, "住民税", "residentTax");

        let national = life_total_line(trace, &national_amounts, national_rule, "所得税", "incomeTax");
        let local = life_total_line(trace, &local_amounts, local_rule, "住民税", "residentTax");
        (national, local)
    }

    fn earthquake(&self, trace: &mut TraceRecorder) -> (Decimal, Decimal) {
        let paid = self.input.deductions.earthquake_paid;
        let rule = &self.rule.earthquake_deduction;

        let national = paid.min(rule.national_cap);
        trace
            .calc(Section::Deduction, "地震保険料控除（所得税控除）")
            .expression(format!(
                "min(支払額, 上限{}万円)",
                format_number(rule.national_cap / dec!(10000))
            ))
            .term(Term::yen("支払額", paid))
            .result(national)
            .result_key("deduction.earthquake.incomeTax")
            .push();

        let local = paid.min(rule.local_cap);
        trace
            .calc(Section::Deduction, "地震保険料控除（住民税控除）")
            .expression(format!(
                "min(支払額, 上限{}円)",
                format_number(rule.local_cap)
            ))
            .term(Term::yen("支払額", paid))
            .result(local)
            .result_key("deduction.earthquake.residentTax")
            .push();

        (national, local)
    }

    /// Medical expense deduction over the income-scaled threshold. The
    /// threshold is not floored at zero, so a loss year raises the
    /// deductible amount.
    fn medical(&self, trace: &mut TraceRecorder) -> Decimal {
        let medical = &self.input.deductions.medical;
        if !medical.enabled {
            trace
                .info(Section::Deduction, "医療費控除（対象外）")
                .expression("医療費控除はOFFのため計算対象外")
                .result_key("deduction.medical.off")
                .push();
            return Decimal::ZERO;
        }

        let rule = &self.rule.medical_deduction;
        let threshold = rule
            .threshold_fixed
            .min(floor_yen(self.income.total_general * rule.threshold_rate));
        let net = (medical.treatment + medical.transport + medical.other - medical.reimbursed)
            .max(Decimal::ZERO);
        let deduction = (net - threshold).clamp(Decimal::ZERO, rule.cap);

        trace
            .calc(Section::Deduction, "医療費控除")
            .expression("max(0, (支払合計−補填) − 閾値)（上限あり）")
            .term(Term::yen("治療費等", medical.treatment))
            .term(Term::yen("通院交通費", medical.transport))
            .term(Term::yen("その他", medical.other))
            .term(Term::yen("補填", medical.reimbursed))
            .term(Term::yen("合計所得金額（総合）", self.income.total_general))
            .term(Term::yen("閾値", threshold))
            .term(Term::yen("上限", rule.cap))
            .result(deduction)
            .result_key("deduction.medical")
            .push();
        deduction
    }
}

fn life_category_lines(
    trace: &mut TraceRecorder,
    categories: &[(&str, &str, Decimal); 3],
    regime: &LifeInsuranceRegimeRule,
    tax_label: &str,
    key_segment: &str,
) -> [Decimal; 3] {
    let mut amounts = [Decimal::ZERO; 3];
    for (slot, (label, key, paid)) in amounts.iter_mut().zip(categories) {
        let (amount, tier_label) = life_category(*paid, regime);
        trace
            .calc(
                Section::Deduction,
                format!("生命保険料控除（{label}・{tax_label}）"),
            )
            .expression(tier_label)
            .term(Term::yen("支払保険料", *paid))
            .result(amount)
            .result_key(format!("deduction.lifeInsurance.{key}.{key_segment}"))
            .push();
        *slot = amount;
    }
    amounts
}

fn life_total_line(
    trace: &mut TraceRecorder,
    amounts: &[Decimal; 3],
    regime: &LifeInsuranceRegimeRule,
    tax_label: &str,
    key_segment: &str,
) -> Decimal {
    let sum: Decimal = amounts.iter().copied().sum();
    let capped = sum.min(regime.total_cap);
    trace
        .calc(Section::Deduction, format!("生命保険料控除（{tax_label}）"))
        .expression(format!(
            "min(一般＋介護医療＋個人年金, 上限{}万円)",
            format_number(regime.total_cap / dec!(10000))
        ))
        .term(Term::yen("一般", amounts[0]))
        .term(Term::yen("介護医療", amounts[1]))
        .term(Term::yen("個人年金", amounts[2]))
        .result(capped)
        .result_key(format!("deduction.lifeInsurance.{key_segment}"))
        .push();
    capped
}

/// Applies one regime's tier table to a paid premium. Returns the
/// floored deduction and the matched tier's label for the trace.
fn life_category(paid: Decimal, regime: &LifeInsuranceRegimeRule) -> (Decimal, String) {
    match regime
        .brackets
        .iter()
        .find(|tier| tier.max_paid.map_or(true, |max| paid <= max))
    {
        Some(tier) => (floor_yen(tier.formula.apply(paid)), tier.label.clone()),
        None => (Decimal::ZERO, String::new()),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{CalcLine, DisplayKind, TaxInput};

    fn base_input() -> TaxInput {
        crate::sample::empty_input(2024)
    }

    fn rule() -> &'static RuleYear {
        crate::rules::resolve(2024)
    }

    fn income_with_total(total: Decimal) -> IncomeBreakdown {
        IncomeBreakdown {
            salary_gross: Decimal::ZERO,
            salary_deduction: Decimal::ZERO,
            salary_income: Decimal::ZERO,
            business_income: Decimal::ZERO,
            stock_general: Decimal::ZERO,
            stock_separate_dividend: Decimal::ZERO,
            stock_separate_gain: Decimal::ZERO,
            total_general: total,
        }
    }

    fn insurance_zero() -> InsuranceTotals {
        InsuranceTotals {
            si_total: Decimal::ZERO,
            nhi_total: Decimal::ZERO,
            np_total: Decimal::ZERO,
            np_months_pay: 0,
            np_months_exempt: 0,
            total: Decimal::ZERO,
        }
    }

    fn run(
        input: &TaxInput,
        income: &IncomeBreakdown,
        insurance: &InsuranceTotals,
    ) -> (DeductionTotals, Vec<CalcLine>) {
        let mut trace = TraceRecorder::new();
        let totals = DeductionCalculator::new(input, rule(), income, insurance).calculate(&mut trace);
        (totals, trace.into_lines())
    }

    fn find<'a>(lines: &'a [CalcLine], key: &str) -> &'a CalcLine {
        lines
            .iter()
            .find(|line| line.result_key.as_deref() == Some(key))
            .unwrap()
    }

    // ==================== basic deduction ====================

    #[test]
    fn basic_deduction_steps_down_with_income() {
        let input = base_input();
        let insurance = insurance_zero();

        let (low, _) = run(&input, &income_with_total(dec!(6950000)), &insurance);
        let (mid, _) = run(&input, &income_with_total(dec!(24000001)), &insurance);
        let (top, _) = run(&input, &income_with_total(dec!(25000001)), &insurance);

        assert_eq!(low.basic_national, dec!(480000));
        assert_eq!(mid.basic_national, dec!(320000));
        assert_eq!(top.basic_national, dec!(0));
    }

    // ==================== social insurance ====================

    #[test]
    fn social_insurance_line_sums_three_schemes() {
        let input = base_input();
        let insurance = InsuranceTotals {
            si_total: dec!(300000),
            nhi_total: dec!(533678),
            np_total: dec!(84900),
            np_months_pay: 5,
            np_months_exempt: 1,
            total: dec!(918578),
        };

        let (totals, lines) = run(&input, &income_with_total(dec!(0)), &insurance);

        assert_eq!(totals.social_insurance, dec!(918578));
        let line = find(&lines, "deduction.socialInsurance.total");
        assert_eq!(line.expression, "社保 + 国保 + 国年");
        assert_eq!(line.terms.len(), 3);
    }

    // ==================== life insurance tiers ====================

    #[test]
    fn life_tiers_follow_income_tax_table() {
        let regime = &rule().life_insurance_deduction.national;
        let cases = [
            (dec!(20000), dec!(20000)),
            (dec!(20001), dec!(20000)),
            (dec!(40000), dec!(30000)),
            (dec!(40001), dec!(30000)),
            (dec!(80000), dec!(40000)),
            (dec!(80001), dec!(40000)),
        ];

        for (paid, expected) in cases {
            let (amount, _) = life_category(paid, regime);
            assert_eq!(amount, expected, "paid {paid}");
        }
    }

    #[test]
    fn life_tiers_follow_resident_tax_table() {
        let regime = &rule().life_insurance_deduction.local;
        let cases = [
            (dec!(20000), dec!(20000)),
            (dec!(20001), dec!(16000)),
            (dec!(40000), dec!(26000)),
            (dec!(40001), dec!(24000)),
            (dec!(80000), dec!(34000)),
            (dec!(80001), dec!(28000)),
        ];

        for (paid, expected) in cases {
            let (amount, _) = life_category(paid, regime);
            assert_eq!(amount, expected, "paid {paid}");
        }
    }

    #[test]
    fn life_totals_cap_the_category_sum() {
        let mut input = base_input();
        input.deductions.life_insurance.general = dec!(80000);
        input.deductions.life_insurance.nursing_medical = dec!(80000);
        input.deductions.life_insurance.pension = dec!(80000);

        let (totals, lines) = run(&input, &income_with_total(dec!(0)), &insurance_zero());

        // 40,000 x 3 hits the income tax cap exactly; 34,000 x 3 is
        // capped down for resident tax.
        assert_eq!(totals.life_national, dec!(120000));
        assert_eq!(totals.life_local, dec!(70000));
        let local = find(&lines, "deduction.lifeInsurance.residentTax");
        assert_eq!(local.expression, "min(一般＋介護医療＋個人年金, 上限7万円)");
    }

    #[test]
    fn life_category_line_shows_tier_label() {
        let mut input = base_input();
        input.deductions.life_insurance.general = dec!(30000);

        let (_, lines) = run(&input, &income_with_total(dec!(0)), &insurance_zero());

        let line = find(&lines, "deduction.lifeInsurance.general.incomeTax");
        assert_eq!(line.expression, "支払保険料 ÷ 2 + 1万円");
        assert_eq!(line.result, Some(dec!(25000)));
    }

    // ==================== earthquake insurance ====================

    #[test]
    fn earthquake_caps_differ_per_tax() {
        let mut input = base_input();
        input.deductions.earthquake_paid = dec!(30000);

        let (totals, lines) = run(&input, &income_with_total(dec!(0)), &insurance_zero());

        assert_eq!(totals.earthquake_national, dec!(30000));
        assert_eq!(totals.earthquake_local, dec!(25000));
        assert_eq!(
            find(&lines, "deduction.earthquake.incomeTax").expression,
            "min(支払額, 上限5万円)"
        );
        assert_eq!(
            find(&lines, "deduction.earthquake.residentTax").expression,
            "min(支払額, 上限25,000円)"
        );
    }

    #[test]
    fn earthquake_large_payment_hits_both_caps() {
        let mut input = base_input();
        input.deductions.earthquake_paid = dec!(60000);

        let (totals, _) = run(&input, &income_with_total(dec!(0)), &insurance_zero());

        assert_eq!(totals.earthquake_national, dec!(50000));
        assert_eq!(totals.earthquake_local, dec!(25000));
    }

    // ==================== medical expenses ====================

    #[test]
    fn medical_below_threshold_deducts_nothing() {
        let mut input = base_input();
        input.deductions.medical.treatment = dec!(40000);
        input.deductions.medical.transport = dec!(10000);

        let (totals, _) = run(&input, &income_with_total(dec!(6950000)), &insurance_zero());

        assert_eq!(totals.medical, dec!(0));
    }

    #[test]
    fn medical_threshold_scales_down_for_low_income() {
        let mut input = base_input();
        input.deductions.medical.treatment = dec!(120000);

        let (totals, lines) = run(&input, &income_with_total(dec!(1000000)), &insurance_zero());

        // min(100,000, 1,000,000 x 5%) = 50,000
        assert_eq!(totals.medical, dec!(70000));
        let line = find(&lines, "deduction.medical");
        assert_eq!(line.terms[5].value, crate::models::TermValue::Number(dec!(50000)));
    }

    #[test]
    fn medical_negative_income_threshold_stays_negative() {
        let mut input = base_input();
        input.deductions.medical.treatment = dec!(10000);

        let (totals, _) = run(&input, &income_with_total(dec!(-1000000)), &insurance_zero());

        assert_eq!(totals.medical, dec!(60000));
    }

    #[test]
    fn medical_deduction_is_capped() {
        let mut input = base_input();
        input.deductions.medical.treatment = dec!(3000000);

        let (totals, _) = run(&input, &income_with_total(dec!(6950000)), &insurance_zero());

        assert_eq!(totals.medical, dec!(2000000));
    }

    #[test]
    fn medical_reimbursement_reduces_the_net() {
        let mut input = base_input();
        input.deductions.medical.treatment = dec!(300000);
        input.deductions.medical.reimbursed = dec!(150000);

        let (totals, _) = run(&input, &income_with_total(dec!(6950000)), &insurance_zero());

        assert_eq!(totals.medical, dec!(50000));
    }

    #[test]
    fn medical_disabled_emits_info_line() {
        let mut input = base_input();
        input.deductions.medical.enabled = false;
        input.deductions.medical.treatment = dec!(500000);

        let (totals, lines) = run(&input, &income_with_total(dec!(6950000)), &insurance_zero());

        assert_eq!(totals.medical, dec!(0));
        let line = find(&lines, "deduction.medical.off");
        assert_eq!(line.display, DisplayKind::Info);
        assert_eq!(line.result, None);
    }

    // ==================== deduction total ====================

    #[test]
    fn total_sums_income_tax_side_components() {
        let mut input = base_input();
        input.deductions.ideco = dec!(120000);
        input.deductions.small_biz_mutual_aid = dec!(240000);
        input.deductions.safety_mutual_aid = dec!(200000);
        input.deductions.life_insurance.general = dec!(80000);
        input.deductions.life_insurance.nursing_medical = dec!(50000);
        input.deductions.life_insurance.pension = dec!(60000);
        input.deductions.earthquake_paid = dec!(30000);
        let insurance = InsuranceTotals {
            si_total: dec!(300000),
            nhi_total: dec!(533678),
            np_total: dec!(84900),
            np_months_pay: 5,
            np_months_exempt: 1,
            total: dec!(918578),
        };

        let (totals, lines) = run(&input, &income_with_total(dec!(6950000)), &insurance);

        // life income tax: 40,000 + 32,500 + 35,000 = 107,500
        assert_eq!(totals.life_national, dec!(107500));
        let expected = dec!(480000)
            + dec!(918578)
            + dec!(120000)
            + dec!(240000)
            + dec!(200000)
            + dec!(107500)
            + dec!(30000);
        assert_eq!(totals.total_national, expected);
        let line = find(&lines, "deduction.total");
        assert_eq!(line.terms.len(), 8);
    }
}
