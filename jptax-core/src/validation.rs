//! Input validation ahead of an engine run.
//!
//! Errors block a calculation; warnings flag suspicious but computable
//! input. Field paths use the camelCase wire names so a caller can map
//! an issue back to the control that produced it.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{InsuranceMode, MixedBlock, PreviousYearInputMode, TaxInput};
use crate::rules;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            field: field.into(),
            message: message.into(),
        });
    }

    fn warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            field: field.into(),
            message: message.into(),
        });
    }
}

/// Checks one input against the structural rules the engine assumes.
pub fn validate(input: &TaxInput) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_year(input, &mut report);
    check_save(input, &mut report);
    check_salary(input, &mut report);
    check_business(input, &mut report);
    check_insurance(input, &mut report);
    check_household(input, &mut report);
    check_family(input, &mut report);
    check_comparison_sites(input, &mut report);

    report
}

fn check_year(input: &TaxInput, report: &mut ValidationReport) {
    if !rules::supported_years().contains(&input.year) {
        report.error("year", "対応していない年度です");
    }
}

fn check_save(input: &TaxInput, report: &mut ValidationReport) {
    match input.save.previous_year_input_mode {
        PreviousYearInputMode::None => {
            report.error(
                "save.previousYearInputMode",
                "前年所得の入力方法を選択してください",
            );
        }
        PreviousYearInputMode::FromSave => {
            if input.save.selected_save_id.is_none() {
                report.error("save.selectedSaveId", "参照する保存データを選択してください");
            }
        }
        PreviousYearInputMode::UseCurrent | PreviousYearInputMode::Manual => {}
    }
}

fn check_salary(input: &TaxInput, report: &mut ValidationReport) {
    let salary = &input.salary;
    if !salary.enabled {
        return;
    }

    if salary.sources.is_empty() {
        report.error("salary.sources", "給与支払先を1件以上入力してください");
    }
    let main_is_member = salary
        .main_source_id
        .as_ref()
        .is_some_and(|id| salary.sources.iter().any(|source| source.id == *id));
    if !main_is_member {
        report.error("salary.mainSourceId", "主たる給与支払先を選択してください");
    }
    for (index, source) in salary.sources.iter().enumerate() {
        if source.annual < Decimal::ZERO {
            report.error(
                format!("salary.sources[{index}].annual"),
                "給与年額は0以上で入力してください",
            );
        }
    }
}

fn check_business(input: &TaxInput, report: &mut ValidationReport) {
    let business = &input.business;
    if !business.enabled {
        return;
    }

    if business.sales <= Decimal::ZERO {
        report.error("business.sales", "売上は0より大きい値を入力してください");
    }
    if business.expenses < Decimal::ZERO {
        report.error("business.expenses", "経費は0以上で入力してください");
    }
}

fn check_insurance(input: &TaxInput, report: &mut ValidationReport) {
    match input.insurance.mode {
        InsuranceMode::EmployeeOnly => {}
        InsuranceMode::NationalOnly => {
            let (pay, exempt) = input
                .insurance
                .national
                .as_ref()
                .map(|national| (national.np.pay_months, national.np.exempt_months))
                .unwrap_or_default();
            if pay + exempt != 12 {
                report.error(
                    "insurance.national.np",
                    "加入月数と免除月数の合計は12ヶ月にしてください",
                );
            }
        }
        InsuranceMode::Mixed => check_mixed_blocks(input, report),
    }
}

fn check_mixed_blocks(input: &TaxInput, report: &mut ValidationReport) {
    let blocks: &[MixedBlock] = input
        .insurance
        .mixed
        .as_ref()
        .map(|mixed| mixed.blocks.as_slice())
        .unwrap_or(&[]);

    let total_months: u32 = blocks.iter().map(MixedBlock::months).sum();
    if total_months != 12 {
        report.error(
            "insurance.mixed.blocks",
            "ブロックの月数合計は12ヶ月にしてください",
        );
    }

    for (index, block) in blocks.iter().enumerate() {
        let months = block.months();
        if !(1..=12).contains(&months) {
            report.error(
                format!("insurance.mixed.blocks[{index}].months"),
                "ブロックの月数は1〜12ヶ月で入力してください",
            );
        }
        if let MixedBlock::National {
            nhi_breakdown,
            np_pay_months,
            np_exempt_months,
            ..
        } = block
        {
            let nhi_months: u32 = nhi_breakdown.iter().map(|sub| sub.months).sum();
            if nhi_months != months {
                report.error(
                    format!("insurance.mixed.blocks[{index}].nhiBreakdown"),
                    "国保内訳の月数合計をブロックの月数と一致させてください",
                );
            }
            if np_pay_months + np_exempt_months != months {
                report.error(
                    format!("insurance.mixed.blocks[{index}].np"),
                    "国民年金の加入月数と免除月数の合計をブロックの月数と一致させてください",
                );
            }
        }
    }
}

fn check_household(input: &TaxInput, report: &mut ValidationReport) {
    let household = &input.insurance.household;
    if household.members < 1 {
        report.error(
            "insurance.household.members",
            "国保加入者数は1人以上で入力してください",
        );
    }
    if household.members_40_64 > household.members {
        report.error(
            "insurance.household.members4064",
            "40〜64歳人数は加入者数以下で入力してください",
        );
    }
    if household.preschool > household.members {
        report.error(
            "insurance.household.preschool",
            "未就学児人数は加入者数以下で入力してください",
        );
    }
    if household.members_40_64 + household.preschool > household.members {
        report.error(
            "insurance.household",
            "40〜64歳人数と未就学児人数の合計は加入者数以下にしてください",
        );
    }
}

fn check_family(input: &TaxInput, report: &mut ValidationReport) {
    let family = &input.family;
    if family.dependents_40_64_count + family.preschool_count > family.dependent_count {
        report.warning("family", "扶養人数の内訳が扶養人数を超えています");
    }
}

fn check_comparison_sites(input: &TaxInput, report: &mut ValidationReport) {
    for (index, site) in input.comparison_sites.iter().enumerate() {
        if site.amount < Decimal::ZERO {
            report.error(
                format!("comparisonSites[{index}].amount"),
                "金額は0以上で入力してください",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{InputMode, NationalInsurance, NhiConfig, NpConfig};
    use crate::sample;

    fn errors_for(input: &TaxInput) -> Vec<ValidationIssue> {
        validate(input).errors
    }

    fn fields(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|issue| issue.field.as_str()).collect()
    }

    // ==================== year and save ====================

    #[test]
    fn unsupported_year_is_rejected() {
        let mut input = sample::demo_input(2024);
        input.year = 1999;

        let errors = errors_for(&input);

        assert_eq!(fields(&errors), vec!["year"]);
        assert_eq!(errors[0].message, "対応していない年度です");
    }

    #[test]
    fn from_save_requires_a_selected_record() {
        let mut input = sample::demo_input(2024);
        input.save.previous_year_input_mode = PreviousYearInputMode::FromSave;
        input.save.selected_save_id = None;

        let errors = errors_for(&input);

        assert_eq!(fields(&errors), vec!["save.selectedSaveId"]);
    }

    #[test]
    fn from_save_with_a_record_is_fine() {
        let mut input = sample::demo_input(2024);
        input.save.previous_year_input_mode = PreviousYearInputMode::FromSave;
        input.save.selected_save_id = Some("7".into());
        input.save.previous_year_total_income = Some(dec!(5000000));

        assert!(validate(&input).is_valid());
    }

    // ==================== salary ====================

    #[test]
    fn enabled_salary_needs_sources_and_a_main() {
        let mut input = sample::demo_input(2024);
        input.salary.sources.clear();
        input.salary.main_source_id = None;

        let errors = errors_for(&input);

        assert_eq!(fields(&errors), vec!["salary.sources", "salary.mainSourceId"]);
    }

    #[test]
    fn main_source_must_be_one_of_the_sources() {
        let mut input = sample::demo_input(2024);
        input.salary.main_source_id = Some("ghost".into());

        let errors = errors_for(&input);

        assert_eq!(fields(&errors), vec!["salary.mainSourceId"]);
        assert_eq!(errors[0].message, "主たる給与支払先を選択してください");
    }

    #[test]
    fn negative_salary_amount_points_at_its_row() {
        let mut input = sample::demo_input(2024);
        input.salary.sources[1].annual = dec!(-1);

        let errors = errors_for(&input);

        assert_eq!(fields(&errors), vec!["salary.sources[1].annual"]);
    }

    #[test]
    fn disabled_salary_is_not_checked() {
        let mut input = sample::demo_input(2024);
        input.salary.enabled = false;
        input.salary.sources.clear();
        input.salary.main_source_id = None;

        assert!(validate(&input).is_valid());
    }

    // ==================== business ====================

    #[test]
    fn enabled_business_needs_positive_sales() {
        let mut input = sample::demo_input(2024);
        input.business.sales = dec!(0);

        let errors = errors_for(&input);

        assert_eq!(fields(&errors), vec!["business.sales"]);
        assert_eq!(errors[0].message, "売上は0より大きい値を入力してください");
    }

    #[test]
    fn negative_expenses_are_rejected() {
        let mut input = sample::demo_input(2024);
        input.business.expenses = dec!(-1);

        let errors = errors_for(&input);

        assert_eq!(fields(&errors), vec!["business.expenses"]);
    }

    // ==================== insurance blocks ====================

    #[test]
    fn mixed_blocks_must_cover_twelve_months() {
        let mut input = sample::demo_input(2024);
        if let Some(mixed) = &mut input.insurance.mixed {
            if let MixedBlock::Employee { months, .. } = &mut mixed.blocks[0] {
                *months = 5;
            }
        }

        let errors = errors_for(&input);

        assert_eq!(fields(&errors), vec!["insurance.mixed.blocks"]);
    }

    #[test]
    fn mixed_mode_without_blocks_cannot_cover_the_year() {
        let mut input = sample::demo_input(2024);
        input.insurance.mixed = None;

        let errors = errors_for(&input);

        assert_eq!(fields(&errors), vec!["insurance.mixed.blocks"]);
        assert_eq!(errors[0].message, "ブロックの月数合計は12ヶ月にしてください");
    }

    #[test]
    fn nhi_breakdown_months_must_match_the_block() {
        let mut input = sample::demo_input(2024);
        if let Some(mixed) = &mut input.insurance.mixed {
            if let MixedBlock::National { nhi_breakdown, .. } = &mut mixed.blocks[1] {
                nhi_breakdown[0].months = 4;
            }
        }

        let errors = errors_for(&input);

        assert_eq!(fields(&errors), vec!["insurance.mixed.blocks[1].nhiBreakdown"]);
    }

    #[test]
    fn np_months_must_match_the_block() {
        let mut input = sample::demo_input(2024);
        if let Some(mixed) = &mut input.insurance.mixed {
            if let MixedBlock::National { np_exempt_months, .. } = &mut mixed.blocks[1] {
                *np_exempt_months = 0;
            }
        }

        let errors = errors_for(&input);

        assert_eq!(fields(&errors), vec!["insurance.mixed.blocks[1].np"]);
    }

    #[test]
    fn national_only_needs_twelve_pension_months() {
        let mut input = sample::demo_input(2024);
        input.insurance.mode = InsuranceMode::NationalOnly;
        input.insurance.mixed = None;
        input.insurance.national = Some(NationalInsurance {
            nhi: NhiConfig {
                mode: InputMode::Manual,
                amount: Some(dec!(300000)),
            },
            np: NpConfig {
                pay_months: 5,
                exempt_months: 6,
                monthly_override: None,
            },
        });

        let errors = errors_for(&input);

        assert_eq!(fields(&errors), vec!["insurance.national.np"]);
    }

    #[test]
    fn national_only_without_config_fails_the_month_check() {
        let mut input = sample::demo_input(2024);
        input.insurance.mode = InsuranceMode::NationalOnly;
        input.insurance.mixed = None;
        input.insurance.national = None;

        let errors = errors_for(&input);

        assert_eq!(fields(&errors), vec!["insurance.national.np"]);
    }

    // ==================== household ====================

    #[test]
    fn household_needs_at_least_the_taxpayer() {
        let mut input = sample::demo_input(2024);
        input.insurance.household.members = 0;
        input.insurance.household.members_40_64 = 0;

        let errors = errors_for(&input);

        assert_eq!(fields(&errors), vec!["insurance.household.members"]);
    }

    #[test]
    fn household_breakdown_cannot_exceed_members() {
        let mut input = sample::demo_input(2024);
        input.insurance.household.members = 2;
        input.insurance.household.members_40_64 = 2;
        input.insurance.household.preschool = 1;

        let errors = errors_for(&input);

        assert_eq!(fields(&errors), vec!["insurance.household"]);
        assert_eq!(
            errors[0].message,
            "40〜64歳人数と未就学児人数の合計は加入者数以下にしてください"
        );
    }

    #[test]
    fn oversized_age_band_is_its_own_error() {
        let mut input = sample::demo_input(2024);
        input.insurance.household.members = 1;
        input.insurance.household.members_40_64 = 2;

        let errors = errors_for(&input);

        assert_eq!(
            fields(&errors),
            vec!["insurance.household.members4064", "insurance.household"]
        );
    }

    // ==================== warnings ====================

    #[test]
    fn family_breakdown_overflow_is_a_warning_only() {
        let mut input = sample::demo_input(2024);
        input.family.dependent_count = 1;
        input.family.dependents_40_64_count = 1;
        input.family.preschool_count = 1;

        let report = validate(&input);

        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].field, "family");
    }

    // ==================== comparison sites ====================

    #[test]
    fn negative_site_amount_is_rejected() {
        let mut input = sample::demo_input(2024);
        input.comparison_sites[0].amount = dec!(-100);

        let errors = errors_for(&input);

        assert_eq!(fields(&errors), vec!["comparisonSites[0].amount"]);
        assert_eq!(errors[0].message, "金額は0以上で入力してください");
    }
}
