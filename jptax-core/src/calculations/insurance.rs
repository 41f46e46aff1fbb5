//! Social insurance premiums: employee scheme amounts, national health
//! insurance (NHI) estimates, and national pension totals.
//!
//! The NHI estimate follows the Setagaya ward method. Each component
//! levies an income-proportional part plus a per-head part, capped per
//! component, and prorates by enrollment months:
//!
//! | Component      | Income rate | Per head | Annual cap |
//! |----------------|-------------|----------|------------|
//! | 基礎（医療）分 | 7.71%       | ￥47,300 | ￥660,000  |
//! | 支援金分       | 2.69%       | ￥16,800 | ￥260,000  |
//! | 介護分 (40-64) | 2.25%       | ￥16,600 | ￥170,000  |
//!
//! The income-proportional part uses the previous year's total income;
//! when no stored figure is referenced, the current year's combined
//! total stands in. Statutory NHI reductions (7/5/2割) are not applied;
//! the engine appends what-if difference lines instead.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::warn;

use crate::calculations::common::{prorate_round, round_yen};
use crate::calculations::income::IncomeBreakdown;
use crate::calculations::recorder::TraceRecorder;
use crate::format::{format_percent, format_percent_plain, format_yen};
use crate::models::{InputMode, InsuranceMode, MixedBlock, RuleYear, Section, TaxInput, Term};

/// One NHI component's levy parameters.
struct NhiComponentSchedule {
    income_rate: Decimal,
    per_capita: Decimal,
    cap: Decimal,
    cap_label: &'static str,
}

const NHI_MEDICAL: NhiComponentSchedule = NhiComponentSchedule {
    income_rate: dec!(0.0771),
    per_capita: dec!(47300),
    cap: dec!(660000),
    cap_label: "66万円",
};

const NHI_SUPPORT: NhiComponentSchedule = NhiComponentSchedule {
    income_rate: dec!(0.0269),
    per_capita: dec!(16800),
    cap: dec!(260000),
    cap_label: "26万円",
};

const NHI_CARE: NhiComponentSchedule = NhiComponentSchedule {
    income_rate: dec!(0.0225),
    per_capita: dec!(16600),
    cap: dec!(170000),
    cap_label: "17万円",
};

/// Premium totals by scheme, plus pension month counts.
#[derive(Debug, Clone, PartialEq)]
pub struct InsuranceTotals {
    pub si_total: Decimal,
    pub nhi_total: Decimal,
    pub np_total: Decimal,
    pub np_months_pay: u32,
    pub np_months_exempt: u32,
    /// Sum of all three schemes, the social insurance deduction.
    pub total: Decimal,
}

/// One NHI component evaluated for a month count. Amounts stay
/// unrounded; the trace lines round for display.
struct NhiComponentDetail {
    income_capped: Decimal,
    equal: Decimal,
    capped_total: Decimal,
}

struct NhiEstimate {
    base: NhiComponentDetail,
    support: NhiComponentDetail,
    care: NhiComponentDetail,
    /// Rounded once over the unrounded component totals.
    total: Decimal,
    previous_income: Decimal,
}

#[derive(Default)]
struct ModeTotals {
    si: Decimal,
    nhi: Decimal,
    np: Decimal,
    pay: u32,
    exempt: u32,
}

pub struct InsuranceEstimator<'a> {
    input: &'a TaxInput,
    rule: &'a RuleYear,
    income: &'a IncomeBreakdown,
}

impl<'a> InsuranceEstimator<'a> {
    pub fn new(input: &'a TaxInput, rule: &'a RuleYear, income: &'a IncomeBreakdown) -> Self {
        Self { input, rule, income }
    }

    pub fn calculate(&self, trace: &mut TraceRecorder) -> InsuranceTotals {
        trace
            .info(Section::InsuranceSi, "保険料入力ルール")
            .expression("手入力と推計は同一年度内で併用可能。国保加入者数は本人を含む。法定軽減は未実装。")
            .note("国保の法定軽減（7割/5割/2割）は未実装（想定差分のみ表示）")
            .push();

        let rule_monthly = self.np_monthly_from_rule();

        let totals = match self.input.insurance.mode {
            InsuranceMode::EmployeeOnly => ModeTotals {
                si: self.employee_only(trace),
                ..ModeTotals::default()
            },
            InsuranceMode::NationalOnly => self.national_only(trace, rule_monthly),
            InsuranceMode::Mixed => self.mixed(trace, rule_monthly),
        };

        trace
            .calc(Section::InsuranceSi, "社会保険料（社保）合計")
            .expression("各ブロック（手入力/推計）の合計")
            .result(totals.si)
            .result_key("insurance.si.total")
            .push();
        trace
            .calc(Section::InsuranceNhi, "国民健康保険料（国保）合計")
            .expression("各ブロック（手入力/推計）の合計")
            .result(totals.nhi)
            .result_key("insurance.nhi.total")
            .push();

        let total_monthly = self.np_monthly_for_total(rule_monthly);
        trace
            .calc(Section::InsuranceNp, "国民年金（国年）合計")
            .expression("月額 × 加入月数")
            .term(Term::yen("月額", total_monthly))
            .term(Term::text("参照年度", format!("{}年度", self.rule.year)))
            .term(Term::month("加入月数", totals.pay))
            .result(totals.np)
            .result_key("insurance.np.total")
            .note(format!(
                "月額{}は{}年度の国民年金月額です。",
                format_yen(total_monthly),
                self.rule.year
            ))
            .push();

        InsuranceTotals {
            si_total: totals.si,
            nhi_total: totals.nhi,
            np_total: totals.np,
            np_months_pay: totals.pay,
            np_months_exempt: totals.exempt,
            total: totals.si + totals.nhi + totals.np,
        }
    }

    /// Employee scheme for the whole year, manual or estimated from the
    /// main salary source.
    fn employee_only(&self, trace: &mut TraceRecorder) -> Decimal {
        let employee = match &self.input.insurance.employee {
            Some(employee) => employee,
            None => return Decimal::ZERO,
        };

        match employee.input_mode {
            InputMode::Manual => {
                let amount = employee.amount.unwrap_or(Decimal::ZERO);
                trace
                    .calc(Section::InsuranceSi, "社保（手入力）")
                    .expression("入力額を採用")
                    .term(Term::yen("社保（合計）", amount))
                    .result(amount)
                    .push();
                amount
            }
            InputMode::Estimate => {
                let base = self.resolve_base_salary(
                    self.input.salary.main_source_id.as_deref(),
                    employee.base_salary_manual,
                );
                let rate = self.rule.defaults.si_rate;
                let estimated = round_yen(base * rate);
                trace
                    .calc(Section::InsuranceSi, "社保（推計年額）")
                    .expression("主たる給与年額 × 推計係数")
                    .term(Term::yen("主たる給与（年額）", base))
                    .term(Term::pct("推計係数", rate, format_percent(rate, 2)))
                    .result(estimated)
                    .result_key("insurance.si.employee.annualEstimated")
                    .push();
                estimated
            }
        }
    }

    /// National schemes for the whole year: NHI (manual or estimated)
    /// plus pension over the paid months.
    fn national_only(&self, trace: &mut TraceRecorder, rule_monthly: Decimal) -> ModeTotals {
        let national = match &self.input.insurance.national {
            Some(national) => national,
            None => return ModeTotals::default(),
        };

        let nhi = match national.nhi.mode {
            InputMode::Manual => {
                let amount = national.nhi.amount.unwrap_or(Decimal::ZERO);
                trace
                    .calc(Section::InsuranceNhi, "国保（手入力）")
                    .expression("入力額を採用")
                    .term(Term::yen("国保（合計）", amount))
                    .result(amount)
                    .result_key("insurance.nhi.total")
                    .push();
                amount
            }
            InputMode::Estimate => {
                let estimate = self.estimate_nhi(12);
                self.push_nhi_estimate_lines(trace, &estimate, "insurance.nhi.estimate", 12, None);
                estimate.total
            }
        };

        let pay = national.np.pay_months;
        let exempt = national.np.exempt_months;
        let monthly = national.np.monthly_override.unwrap_or(rule_monthly);
        let np = monthly * Decimal::from(pay);
        self.push_np_period_lines(trace, monthly, np, pay, exempt);

        ModeTotals {
            si: Decimal::ZERO,
            nhi,
            np,
            pay,
            exempt,
        }
    }

    /// A year split into enrollment blocks, each with its own manual or
    /// estimated sub-periods.
    fn mixed(&self, trace: &mut TraceRecorder, rule_monthly: Decimal) -> ModeTotals {
        let mut totals = ModeTotals::default();
        let blocks: &[MixedBlock] = self
            .input
            .insurance
            .mixed
            .as_ref()
            .map(|mixed| mixed.blocks.as_slice())
            .unwrap_or(&[]);

        for (block_index, block) in blocks.iter().enumerate() {
            let block_no = block_index as u32 + 1;
            match block {
                MixedBlock::Employee { breakdown, .. } => {
                    for (sub_index, sub) in breakdown.iter().enumerate() {
                        let sub_no = sub_index as u32 + 1;
                        totals.si += self.employee_sub_period(trace, sub, block_no, sub_no);
                    }
                }
                MixedBlock::National {
                    nhi_breakdown,
                    np_pay_months,
                    np_exempt_months,
                    np_monthly_override,
                    ..
                } => {
                    for (sub_index, sub) in nhi_breakdown.iter().enumerate() {
                        let sub_no = sub_index as u32 + 1;
                        totals.nhi += self.nhi_sub_period(trace, sub, block_no, sub_no);
                    }
                    let monthly = np_monthly_override.unwrap_or(rule_monthly);
                    totals.np += monthly * Decimal::from(*np_pay_months);
                    totals.pay += np_pay_months;
                    totals.exempt += np_exempt_months;
                }
            }
        }

        // The monthly amount shown on the period lines reads the
        // year-level national config, not the block overrides.
        let display_monthly = self
            .input
            .insurance
            .national
            .as_ref()
            .and_then(|national| national.np.monthly_override)
            .unwrap_or(rule_monthly);
        self.push_np_period_lines(trace, display_monthly, totals.np, totals.pay, totals.exempt);

        totals
    }

    fn employee_sub_period(
        &self,
        trace: &mut TraceRecorder,
        sub: &crate::models::EmployeeSubPeriod,
        block_no: u32,
        sub_no: u32,
    ) -> Decimal {
        let key = format!("insurance.si.block{block_no}.sub{sub_no}.amount");
        match sub.mode {
            InputMode::Manual => {
                let amount = sub.amount.unwrap_or(Decimal::ZERO);
                trace
                    .calc(Section::InsuranceSi, format!("社保（ブロック{block_no} 手入力）"))
                    .expression("入力額")
                    .term(Term::month("月数", sub.months))
                    .result(amount)
                    .result_key(key)
                    .push();
                amount
            }
            InputMode::Estimate => {
                let base = self
                    .resolve_base_salary(sub.base_salary_source_id.as_deref(), sub.base_salary_manual);
                let rate = self.rule.defaults.si_rate;
                let annual = round_yen(base * rate);
                trace
                    .calc(Section::InsuranceSi, format!("社保（ブロック{block_no} 推計年額）"))
                    .expression("基準給与（年額） × 推計係数")
                    .term(Term::yen("基準給与（年額）", base))
                    .term(Term::pct("推計係数", rate, format_percent(rate, 2)))
                    .result(annual)
                    .result_key(format!(
                        "insurance.si.block{block_no}.sub{sub_no}.annualEstimated"
                    ))
                    .push();

                let amount = prorate_round(annual, sub.months);
                trace
                    .calc(Section::InsuranceSi, format!("社保（ブロック{block_no} 按分）"))
                    .expression("推計年額 × 月数 / 12")
                    .term(Term::yen("推計年額", annual))
                    .term(Term::month("月数", sub.months))
                    .result(amount)
                    .result_key(key)
                    .note("按分（年額×月数/12）は円単位で四捨五入")
                    .push();
                amount
            }
        }
    }

    fn nhi_sub_period(
        &self,
        trace: &mut TraceRecorder,
        sub: &crate::models::NhiSubPeriod,
        block_no: u32,
        sub_no: u32,
    ) -> Decimal {
        let prefix = format!("insurance.nhi.block{block_no}.sub{sub_no}");
        match sub.mode {
            InputMode::Manual => {
                let amount = sub.amount.unwrap_or(Decimal::ZERO);
                trace
                    .calc(Section::InsuranceNhi, format!("国保（ブロック{block_no} 手入力）"))
                    .expression("入力額")
                    .term(Term::month("月数", sub.months))
                    .result(amount)
                    .result_key(format!("{prefix}.amount"))
                    .push();
                amount
            }
            InputMode::Estimate => {
                let estimate = self.estimate_nhi(sub.months);
                self.push_nhi_estimate_lines(trace, &estimate, &prefix, sub.months, Some(block_no));
                estimate.total
            }
        }
    }

    /// Pension period lines: the month split info plus the period total.
    fn push_np_period_lines(
        &self,
        trace: &mut TraceRecorder,
        monthly: Decimal,
        total: Decimal,
        pay: u32,
        exempt: u32,
    ) {
        trace
            .info(Section::InsuranceNp, "国民年金（月数内訳）")
            .expression("加入と免除を同一年で分割可能")
            .term(Term::month("加入月数", pay))
            .term(Term::month("免除月数", exempt))
            .result_key("insurance.np.infoMonths")
            .push();
        trace
            .calc(Section::InsuranceNp, "国民年金保険料")
            .expression("月額×加入月数（免除は￥0）")
            .term(Term::yen("月額", monthly))
            .term(Term::month("加入月数", pay))
            .result(total)
            .result_key("insurance.np.total")
            .push();
    }

    /// Estimates NHI for a month count with the Setagaya component
    /// schedule. The previous year's income drives the income part.
    fn estimate_nhi(&self, months: u32) -> NhiEstimate {
        let previous_income = self.previous_year_income();
        let household = &self.input.insurance.household;

        let base = nhi_component(previous_income, household.members, months, &NHI_MEDICAL);
        let support = nhi_component(previous_income, household.members, months, &NHI_SUPPORT);
        let care = nhi_component(previous_income, household.members_40_64, months, &NHI_CARE);
        let total = round_yen(base.capped_total + support.capped_total + care.capped_total);

        NhiEstimate {
            base,
            support,
            care,
            total,
            previous_income,
        }
    }

    fn push_nhi_estimate_lines(
        &self,
        trace: &mut TraceRecorder,
        estimate: &NhiEstimate,
        key_prefix: &str,
        months: u32,
        block_no: Option<u32>,
    ) {
        let title_suffix = block_no
            .map(|no| format!("（ブロック{no}）"))
            .unwrap_or_default();
        let months_text = match block_no {
            Some(_) => format!("{months}ヶ月"),
            None => "月数".to_string(),
        };
        let rate_label = format_percent_plain(NHI_MEDICAL.income_rate, 2);
        let household = &self.input.insurance.household;

        trace
            .calc(Section::InsuranceNhi, format!("国保 基礎（医療）分 所得割{title_suffix}"))
            .expression(format!(
                "min(前年総所得 × {rate_label} × {months_text}/12, 上限{} × {months_text}/12)",
                NHI_MEDICAL.cap_label
            ))
            .term(Term::yen("前年総所得", estimate.previous_income))
            .result(round_yen(estimate.base.income_capped))
            .result_key(format!("{key_prefix}.base.income"))
            .push();
        trace
            .calc(Section::InsuranceNhi, format!("国保 基礎（医療）分 均等割{title_suffix}"))
            .expression(format!("加入者数 × 均等割額 × {months_text}/12"))
            .term(Term::count("加入者数", household.members))
            .term(Term::yen("均等割額", NHI_MEDICAL.per_capita))
            .result(round_yen(estimate.base.equal))
            .result_key(format!("{key_prefix}.base.equal"))
            .push();
        trace
            .calc(Section::InsuranceNhi, format!("国保 基礎（医療）分 合計{title_suffix}"))
            .expression(format!("min(所得割 + 均等割, 上限{})", NHI_MEDICAL.cap_label))
            .result(round_yen(estimate.base.capped_total))
            .result_key(format!("{key_prefix}.base"))
            .push();
        trace
            .calc(Section::InsuranceNhi, format!("国保 支援金分{title_suffix}"))
            .expression(format!("min(所得割 + 均等割, 上限{})", NHI_SUPPORT.cap_label))
            .result(round_yen(estimate.support.capped_total))
            .result_key(format!("{key_prefix}.support"))
            .push();
        trace
            .calc(Section::InsuranceNhi, format!("国保 介護分{title_suffix}"))
            .expression(format!("min(所得割 + 均等割, 上限{})", NHI_CARE.cap_label))
            .result(round_yen(estimate.care.capped_total))
            .result_key(format!("{key_prefix}.care"))
            .push();

        let (final_title, final_key, final_notes) = match block_no {
            Some(no) => (
                format!("国保（ブロック{no} 推計）合計"),
                format!("{key_prefix}.amount"),
                vec![format!("世田谷区の計算方法に基づく推計値（{months}ヶ月分）")],
            ),
            None => (
                "国保（推計）合計".to_string(),
                format!("{key_prefix}.total"),
                vec![
                    "世田谷区の計算方法に基づく推計値です。".to_string(),
                    "実際の保険料は前年所得、加入者数、年齢構成等により異なります。".to_string(),
                ],
            ),
        };
        let mut builder = trace
            .calc(Section::InsuranceNhi, final_title)
            .expression("基礎（医療）分 + 支援金分 + 介護分")
            .result(estimate.total)
            .result_key(final_key);
        for note in final_notes {
            builder = builder.note(note);
        }
        builder.push();
    }

    /// Previous-year total income: the referenced figure when present,
    /// otherwise this year's combined total.
    fn previous_year_income(&self) -> Decimal {
        self.input
            .save
            .previous_year_total_income
            .unwrap_or(self.income.total_general)
    }

    /// Base salary for an estimate: the named source, then the manual
    /// amount, then the gross salary total.
    fn resolve_base_salary(&self, source_id: Option<&str>, manual: Option<Decimal>) -> Decimal {
        if let Some(id) = source_id {
            if let Some(source) = self.input.salary.sources.iter().find(|s| s.id == id) {
                return source.annual;
            }
            warn!(source_id = %id, "base salary source not found, falling back");
        }
        if let Some(manual) = manual {
            return manual;
        }
        self.income.salary_gross
    }

    fn np_monthly_from_rule(&self) -> Decimal {
        let premium = &self.rule.pension.national_pension_monthly;
        match premium.value {
            Some(value) => value,
            None => {
                if premium.needs_update {
                    warn!(
                        year = self.rule.year,
                        "national pension premium not yet published, treating as zero"
                    );
                }
                Decimal::ZERO
            }
        }
    }

    /// Monthly amount shown on the year total line. Mixed years read
    /// the first national block's override.
    fn np_monthly_for_total(&self, rule_monthly: Decimal) -> Decimal {
        match self.input.insurance.mode {
            InsuranceMode::Mixed => self
                .input
                .insurance
                .mixed
                .as_ref()
                .and_then(|mixed| {
                    mixed.blocks.iter().find_map(|block| match block {
                        MixedBlock::National {
                            np_monthly_override, ..
                        } => *np_monthly_override,
                        MixedBlock::Employee { .. } => None,
                    })
                })
                .unwrap_or(rule_monthly),
            _ => self
                .input
                .insurance
                .national
                .as_ref()
                .and_then(|national| national.np.monthly_override)
                .unwrap_or(rule_monthly),
        }
    }
}

/// One component: capped income part plus per-head part, capped again
/// as a pair, all prorated by months.
fn nhi_component(
    previous_income: Decimal,
    heads: u32,
    months: u32,
    schedule: &NhiComponentSchedule,
) -> NhiComponentDetail {
    let months = Decimal::from(months);
    let cap = schedule.cap * months / dec!(12);
    let income_raw = previous_income * schedule.income_rate * months / dec!(12);
    let income_capped = income_raw.min(cap);
    let equal = Decimal::from(heads) * schedule.per_capita * months / dec!(12);
    let capped_total = (income_capped + equal).min(cap);

    NhiComponentDetail {
        income_capped,
        equal,
        capped_total,
    }
}

/// Appends the what-if lines for the unimplemented statutory NHI
/// reductions. Differences are negative amounts against the estimate.
pub(crate) fn push_nhi_reduction_whatifs(trace: &mut TraceRecorder, nhi_total: Decimal) {
    if nhi_total <= Decimal::ZERO {
        return;
    }

    trace
        .info(Section::Diff, "国保法定軽減（未実装）")
        .expression("法定軽減が適用された場合の想定差分")
        .result_key("diff.nhi.reductionInfo")
        .note("国保の法定軽減（7割/5割/2割）は未実装です。以下は参考値です。")
        .push();

    const TIERS: [(&str, u32); 3] = [("7割", 70), ("5割", 50), ("2割", 20)];
    for (label, percent) in TIERS {
        let rate = Decimal::from(percent) / dec!(100);
        let remaining = 100 - percent;
        let diff = round_yen(nhi_total * rate);
        if diff <= Decimal::ZERO {
            continue;
        }
        trace
            .calc(Section::Diff, format!("{label}軽減適用時の想定差分"))
            .expression(format!("国保料 - 国保料 × (100% - {percent}%)"))
            .term(Term::yen("国保料", nhi_total))
            .term(Term::pct("軽減率", rate, format!("{percent}%")))
            .term(Term::pct(
                "軽減後負担率",
                Decimal::from(remaining) / dec!(100),
                format!("{remaining}%"),
            ))
            .result(-diff)
            .result_key(format!("diff.nhi.reduction{percent}"))
            .note(format!(
                "{label}軽減が適用された場合、国保料は{remaining}%になります"
            ))
            .push();
    }
}
