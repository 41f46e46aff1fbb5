//! Tax amounts on the assembled income and deductions: progressive
//! income tax, flat-rate resident tax, and the separate taxation of
//! stock income.
//!
//! Both taxable incomes drop fractions below one thousand yen. The
//! separately taxed stock base is split into its statutory parts with
//! fixed rates even when the combined rate is overridden, because the
//! parts flow into different tax totals:
//!
//! | Part             | Rate   | Flows into  |
//! |------------------|--------|-------------|
//! | 所得税           | 15%    | income tax  |
//! | 復興特別所得税   | 0.315% | income tax  |
//! | 住民税           | 5%     | resident tax|

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::warn;

use crate::calculations::common::{floor_to_thousand, floor_yen, pick_bracket_value};
use crate::calculations::deductions::DeductionTotals;
use crate::calculations::income::IncomeBreakdown;
use crate::calculations::recorder::TraceRecorder;
use crate::format::{format_percent, format_percent_plain, format_yen};
use crate::models::{RuleYear, Section, TaxInput, Term};

const SEPARATE_INCOME_RATE: Decimal = dec!(0.15);
const SEPARATE_RECONSTRUCTION_RATE: Decimal = dec!(0.00315);
const SEPARATE_RESIDENT_RATE: Decimal = dec!(0.05);

/// Resident tax basic deduction fallback: the income tax amount less a
/// fixed statutory gap.
const RESIDENT_BASIC_GAP: Decimal = dec!(50000);

#[derive(Debug, Clone, PartialEq)]
pub struct TaxResult {
    pub taxable_general: Decimal,
    /// Marginal rate applied to the general taxable income.
    pub income_tax_rate: Decimal,
    pub income_tax_general: Decimal,
    pub separate_tax: Decimal,
    pub separate_income_tax: Decimal,
    pub separate_reconstruction_tax: Decimal,
    pub separate_resident_tax: Decimal,
    pub income_tax_total: Decimal,
    pub resident_basic_deduction: Decimal,
    pub resident_deduction_total: Decimal,
    pub resident_taxable: Decimal,
    pub resident_rate: Decimal,
    pub resident_income_part: Decimal,
    pub resident_per_capita: Decimal,
    pub resident_total: Decimal,
}

struct SeparateAmounts {
    base: Decimal,
    rate: Decimal,
    total: Decimal,
    income: Decimal,
    reconstruction: Decimal,
    resident: Decimal,
}

struct ResidentParts {
    basic: Decimal,
    deduction_total: Decimal,
    taxable: Decimal,
    rate: Decimal,
    income_part: Decimal,
    per_capita: Decimal,
    total: Decimal,
}

pub struct TaxCalculator<'a> {
    input: &'a TaxInput,
    rule: &'a RuleYear,
    income: &'a IncomeBreakdown,
    deductions: &'a DeductionTotals,
}

impl<'a> TaxCalculator<'a> {
    pub fn new(
        input: &'a TaxInput,
        rule: &'a RuleYear,
        income: &'a IncomeBreakdown,
        deductions: &'a DeductionTotals,
    ) -> Self {
        Self {
            input,
            rule,
            income,
            deductions,
        }
    }

    pub fn calculate(&self, trace: &mut TraceRecorder) -> TaxResult {
        let taxable_general = self.taxable_general(trace);
        let (income_tax_rate, income_tax_general) = self.general_income_tax(trace, taxable_general);

        // The separate split feeds both tax totals, so it is computed
        // ahead of its own trace line.
        let separate = self.separate_amounts();

        let resident = self.resident_tax(trace, separate.resident);

        let income_tax_total =
            income_tax_general + separate.income + separate.reconstruction;
        trace
            .calc(Section::TaxIncome, "所得税（合計）")
            .expression("所得税（総合課税）+ 分離課税の所得税 + 復興特別所得税")
            .term(Term::yen("所得税（総合課税）", income_tax_general))
            .term(Term::yen("分離課税の所得税", separate.income))
            .term(Term::yen("復興特別所得税", separate.reconstruction))
            .result(income_tax_total)
            .result_key("tax.income.total")
            .push();

        self.push_separate_line(trace, &separate);

        TaxResult {
            taxable_general,
            income_tax_rate,
            income_tax_general,
            separate_tax: separate.total,
            separate_income_tax: separate.income,
            separate_reconstruction_tax: separate.reconstruction,
            separate_resident_tax: separate.resident,
            income_tax_total,
            resident_basic_deduction: resident.basic,
            resident_deduction_total: resident.deduction_total,
            resident_taxable: resident.taxable,
            resident_rate: resident.rate,
            resident_income_part: resident.income_part,
            resident_per_capita: resident.per_capita,
            resident_total: resident.total,
        }
    }

    fn taxable_general(&self, trace: &mut TraceRecorder) -> Decimal {
        let raw = (self.income.total_general - self.deductions.total_national).max(Decimal::ZERO);
        let taxable = floor_to_thousand(raw);
        trace
            .calc(Section::Taxable, "課税所得（総合課税）")
            .expression("floor(max(0, 総所得（総合） − 所得控除合計) / 1000) × 1000")
            .term(Term::yen("総所得（総合）", self.income.total_general))
            .term(Term::yen("所得控除合計", self.deductions.total_national))
            .term(Term::yen("計算値", raw))
            .result(taxable)
            .result_key("taxable.general")
            .note("1000円未満の端数を切り捨て")
            .push();
        taxable
    }

    /// Progressive tax from the marginal rate table, with the rate
    /// override applied on top of the matched row.
    fn general_income_tax(&self, trace: &mut TraceRecorder, taxable: Decimal) -> (Decimal, Decimal) {
        let rows = &self.rule.income_tax.rate_table;
        let row = rows
            .iter()
            .find(|row| row.max_taxable.map_or(true, |max| taxable <= max))
            .or_else(|| rows.last());

        let (row_rate, row_deduction, label) = match row {
            Some(row) => (row.rate, row.deduction, row.label.as_str()),
            None => {
                warn!(year = self.rule.year, "income tax rate table is empty");
                (Decimal::ZERO, Decimal::ZERO, "")
            }
        };
        let rate = self.input.overrides.income_tax_rate.unwrap_or(row_rate);

        trace
            .info(Section::TaxIncome, "所得税（限界税率）")
            .expression("課税所得金額に応じた税率区分")
            .term(Term::text("該当レンジ", label))
            .term(Term::pct("税率", rate, format_percent(rate, 2)))
            .term(Term::yen("控除額", row_deduction))
            .result_key("tax.income.marginalRate")
            .push();

        let tax = floor_yen(taxable * rate - row_deduction).max(Decimal::ZERO);
        trace
            .calc(Section::TaxIncome, "所得税（総合課税）")
            .expression("floor(課税所得 × 税率 − 控除額)")
            .term(Term::yen("課税所得", taxable))
            .term(Term::pct("税率", rate, format_percent(rate, 2)))
            .term(Term::yen("控除額", row_deduction))
            .result(tax)
            .result_key("tax.income.general")
            .push();

        (rate, tax)
    }

    fn resident_tax(&self, trace: &mut TraceRecorder, separate_resident: Decimal) -> ResidentParts {
        let rule = &self.rule.resident_tax;
        let rate = self
            .input
            .overrides
            .resident_income_rate
            .unwrap_or(rule.income_rate);

        trace
            .info(Section::TaxResident, "住民税（限界税率）")
            .expression("基準自治体の所得割率")
            .term(Term::text("基準自治体", rule.municipality.as_str()))
            .term(Term::pct("所得割率", rate, format_percent(rate, 0)))
            .result_key("tax.resident.marginalRate")
            .push();

        let income_amount = self.income.total_general;
        trace
            .calc(Section::TaxResident, "住民税 所得額")
            .expression("総所得（給与所得 + 事業所得 + 株式（総合））")
            .term(Term::yen("給与所得", self.income.salary_income))
            .term(Term::yen("事業所得", self.income.business_income))
            .term(Term::yen("株式（総合）", self.income.stock_general))
            .result(income_amount)
            .result_key("tax.resident.incomeAmount")
            .push();

        // Resident basic deduction: the year rule's own table when it
        // has one, otherwise the income tax amount less the fixed gap.
        let basic = match &rule.basic_deduction {
            Some(table) => pick_bracket_value(self.income.total_general, &table.brackets),
            None => (self.deductions.basic_national - RESIDENT_BASIC_GAP).max(Decimal::ZERO),
        };
        let d = self.deductions;
        let deduction_total = basic
            + d.social_insurance
            + d.ideco
            + d.small_biz
            + d.safety
            + d.life_local
            + d.earthquake_local
            + d.medical;
        let taxable = floor_to_thousand((income_amount - deduction_total).max(Decimal::ZERO));
        trace
            .calc(Section::TaxResident, "住民税 課税所得金額")
            .expression("floor(max(0, 所得額 − 所得控除合計) / 1000) × 1000")
            .term(Term::yen("所得額", income_amount))
            .term(Term::yen("基礎控除（住民税）", basic))
            .term(Term::yen("社会保険料控除", d.social_insurance))
            .term(Term::yen("iDeCo掛金", d.ideco))
            .term(Term::yen("小規模企業共済", d.small_biz))
            .term(Term::yen("経営セーフティ共済", d.safety))
            .term(Term::yen("生命保険料控除（住民税）", d.life_local))
            .term(Term::yen("地震保険料控除（住民税）", d.earthquake_local))
            .term(Term::yen("医療費控除", d.medical))
            .term(Term::yen("所得控除合計", deduction_total))
            .result(taxable)
            .result_key("tax.resident.taxableIncome")
            .note("1000円未満の端数を切り捨て")
            .note("生命保険料控除と地震保険料控除は住民税控除の計算結果を使用")
            .push();

        let income_part = floor_yen(taxable * rate);
        trace
            .calc(Section::TaxResident, "住民税（所得割）")
            .expression(format!(
                "floor(課税所得金額 × 所得割率{})",
                format_percent_plain(rate, 0)
            ))
            .term(Term::yen("課税所得金額", taxable))
            .term(Term::pct("所得割率", rate, format_percent(rate, 0)))
            .result(income_part)
            .result_key("tax.resident.incomePart")
            .push();

        let per_capita = rule.per_capita;
        let total = income_part + per_capita + separate_resident;
        trace
            .calc(Section::TaxResident, "住民税（合計）")
            .expression("所得割 + 均等割 + 分離課税の住民税")
            .term(Term::yen("所得割", income_part))
            .term(Term::yen("均等割", per_capita))
            .term(Term::yen("分離課税の住民税", separate_resident))
            .result(total)
            .result_key("tax.resident.total")
            .push();

        ResidentParts {
            basic,
            deduction_total,
            taxable,
            rate,
            income_part,
            per_capita,
            total,
        }
    }

    fn separate_amounts(&self) -> SeparateAmounts {
        let base = self.income.stock_separate_dividend + self.income.stock_separate_gain;
        let rate = self
            .input
            .overrides
            .separate_tax_rate
            .unwrap_or(self.rule.separate_tax.stock.rate);

        SeparateAmounts {
            base,
            rate,
            total: floor_yen(base * rate),
            income: floor_yen(base * SEPARATE_INCOME_RATE),
            reconstruction: floor_yen(base * SEPARATE_RECONSTRUCTION_RATE),
            resident: floor_yen(base * SEPARATE_RESIDENT_RATE),
        }
    }

    fn push_separate_line(&self, trace: &mut TraceRecorder, separate: &SeparateAmounts) {
        let rate_label = format_percent_plain(separate.rate, 3);
        trace
            .calc(Section::TaxSeparate, "株式（申告分離課税）税額")
            .expression(format!("floor((配当＋売買益)×税率{rate_label})"))
            .term(Term::yen("配当（分離）", self.income.stock_separate_dividend))
            .term(Term::yen("売買益（分離）", self.income.stock_separate_gain))
            .term(Term::pct("税率", separate.rate, format_percent(separate.rate, 3)))
            .result(separate.total)
            .result_key("tax.separate.stock")
            .note(format!("税率{rate_label}の内訳:"))
            .note(format!(
                "- 所得税: {} = {}",
                format_percent_plain(SEPARATE_INCOME_RATE, 2),
                format_yen(separate.income)
            ))
            .note(format!(
                "- 復興特別所得税: {} = {}",
                format_percent_plain(SEPARATE_RECONSTRUCTION_RATE, 3),
                format_yen(separate.reconstruction)
            ))
            .note(format!(
                "- 住民税: {} = {}",
                format_percent_plain(SEPARATE_RESIDENT_RATE, 2),
                format_yen(separate.resident)
            ))
            .push();
    }
}
