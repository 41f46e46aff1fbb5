//! Canned inputs for demos and tests.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{
    BlueMode, BlueReturn, BusinessInput, ComparisonSite, DeductionInput, EmployeeSubPeriod,
    FamilyInput, InputMode, InsuranceInput, InsuranceMode, LifeInsurancePaid, MedicalInput,
    MixedBlock, MixedInsurance, NhiHousehold, NhiSubPeriod, OverrideInput, PreviousYearInputMode,
    SalaryInput, SalarySource, SaveReference, StockEntry, StockInput, StockTaxMode, TaxInput,
};

/// Input with everything disabled or zero.
///
/// The previous-year input mode is deliberately unset, so this input
/// does not validate; it is the blank slate a UI starts from.
pub fn empty_input(year: i32) -> TaxInput {
    TaxInput {
        year,
        family: FamilyInput {
            age: 0,
            spouse: 0,
            dependent_count: 0,
            dependents_40_64_count: 0,
            preschool_count: 0,
        },
        salary: SalaryInput {
            enabled: false,
            sources: Vec::new(),
            main_source_id: None,
        },
        business: BusinessInput {
            enabled: false,
            sales: Decimal::ZERO,
            expenses: Decimal::ZERO,
            blue: BlueReturn {
                enabled: false,
                mode: BlueMode::Electronic,
            },
        },
        stocks: StockInput {
            dividend: StockEntry {
                amount: Decimal::ZERO,
                tax_mode: StockTaxMode::General,
            },
            capital_gain: StockEntry {
                amount: Decimal::ZERO,
                tax_mode: StockTaxMode::General,
            },
        },
        deductions: DeductionInput {
            ideco: Decimal::ZERO,
            small_biz_mutual_aid: Decimal::ZERO,
            safety_mutual_aid: Decimal::ZERO,
            life_insurance: LifeInsurancePaid {
                general: Decimal::ZERO,
                nursing_medical: Decimal::ZERO,
                pension: Decimal::ZERO,
            },
            earthquake_paid: Decimal::ZERO,
            medical: MedicalInput {
                enabled: true,
                treatment: Decimal::ZERO,
                transport: Decimal::ZERO,
                other: Decimal::ZERO,
                reimbursed: Decimal::ZERO,
            },
        },
        insurance: InsuranceInput {
            mode: InsuranceMode::EmployeeOnly,
            employee: None,
            national: None,
            mixed: None,
            household: NhiHousehold {
                members: 1,
                members_40_64: 0,
                preschool: 0,
            },
        },
        overrides: OverrideInput {
            income_tax_rate: None,
            resident_income_rate: None,
            separate_tax_rate: None,
        },
        comparison_sites: Vec::new(),
        save: SaveReference {
            selected_save_id: None,
            previous_year_total_income: None,
            previous_year_input_mode: PreviousYearInputMode::None,
        },
    }
}

/// Fully populated example exercising every stage: two salary sources,
/// a blue-return business, both stock taxation modes, a year split
/// between employee and national insurance, and comparison sites.
pub fn demo_input(year: i32) -> TaxInput {
    let mut input = empty_input(year);

    input.family = FamilyInput {
        age: 42,
        spouse: 1,
        dependent_count: 1,
        dependents_40_64_count: 0,
        preschool_count: 0,
    };

    input.salary = SalaryInput {
        enabled: true,
        sources: vec![
            SalarySource {
                id: "src-a".into(),
                name: "支払先A".into(),
                annual: dec!(4000000),
            },
            SalarySource {
                id: "src-b".into(),
                name: "支払先B".into(),
                annual: dec!(1200000),
            },
        ],
        main_source_id: Some("src-a".into()),
    };

    input.business = BusinessInput {
        enabled: true,
        sales: dec!(5000000),
        expenses: dec!(1200000),
        blue: BlueReturn {
            enabled: true,
            mode: BlueMode::Electronic,
        },
    };

    input.stocks = StockInput {
        dividend: StockEntry {
            amount: dec!(80000),
            tax_mode: StockTaxMode::General,
        },
        capital_gain: StockEntry {
            amount: dec!(200000),
            tax_mode: StockTaxMode::Separate,
        },
    };

    input.deductions = DeductionInput {
        ideco: dec!(120000),
        small_biz_mutual_aid: dec!(240000),
        safety_mutual_aid: dec!(200000),
        life_insurance: LifeInsurancePaid {
            general: dec!(80000),
            nursing_medical: dec!(50000),
            pension: dec!(60000),
        },
        earthquake_paid: dec!(30000),
        medical: MedicalInput {
            enabled: true,
            treatment: dec!(40000),
            transport: dec!(10000),
            other: Decimal::ZERO,
            reimbursed: Decimal::ZERO,
        },
    };

    input.insurance = InsuranceInput {
        mode: InsuranceMode::Mixed,
        employee: None,
        national: None,
        mixed: Some(MixedInsurance {
            blocks: vec![
                MixedBlock::Employee {
                    id: "block-1".into(),
                    months: 6,
                    breakdown: vec![EmployeeSubPeriod {
                        id: "block-1-sub-1".into(),
                        mode: InputMode::Estimate,
                        months: 6,
                        amount: None,
                        base_salary_source_id: Some("src-a".into()),
                        base_salary_manual: None,
                    }],
                },
                MixedBlock::National {
                    id: "block-2".into(),
                    months: 6,
                    nhi_breakdown: vec![NhiSubPeriod {
                        id: "block-2-sub-1".into(),
                        mode: InputMode::Estimate,
                        months: 6,
                        amount: None,
                    }],
                    np_pay_months: 5,
                    np_exempt_months: 1,
                    np_monthly_override: None,
                },
            ],
        }),
        household: NhiHousehold {
            members: 3,
            members_40_64: 1,
            preschool: 0,
        },
    };

    input.comparison_sites = vec![
        ComparisonSite {
            id: "site-a".into(),
            name: "サイトA".into(),
            amount: dec!(90000),
        },
        ComparisonSite {
            id: "site-b".into(),
            name: "サイトB".into(),
            amount: dec!(110000),
        },
    ];

    input.save = SaveReference {
        selected_save_id: None,
        previous_year_total_income: None,
        previous_year_input_mode: PreviousYearInputMode::UseCurrent,
    };

    input
}
