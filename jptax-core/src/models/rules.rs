use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fully resolved parameter set for one fiscal year.
///
/// Instances come out of the year-table resolver with every inherited
/// field already merged in; calculation code never sees partial years.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleYear {
    pub year: i32,
    pub income_tax: IncomeTaxRule,
    pub pension: PensionRule,
    pub resident_tax: ResidentTaxRule,
    pub separate_tax: SeparateTaxRule,
    pub medical_deduction: MedicalDeductionRule,
    pub life_insurance_deduction: LifeInsuranceDeductionRule,
    pub earthquake_deduction: EarthquakeDeductionRule,
    pub blue_deduction: BlueDeductionRule,
    pub defaults: DefaultsRule,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeTaxRule {
    pub rate_table: Vec<TaxRateRow>,
    pub basic_deduction: BasicDeductionRule,
    pub salary_income_deduction: SalaryDeductionRule,
    pub dependent_income_threshold: Option<Decimal>,
}

/// One progressive rate bracket. `max_taxable: None` marks the top row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRateRow {
    pub max_taxable: Option<Decimal>,
    pub rate: Decimal,
    pub deduction: Decimal,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicDeductionRule {
    pub brackets: Vec<BasicDeductionBracket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicDeductionBracket {
    pub max_income: Option<Decimal>,
    pub deduction: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalaryDeductionRule {
    pub brackets: Vec<SalaryDeductionBracket>,
    pub minimum: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryDeductionBracket {
    pub max_income: Option<Decimal>,
    pub formula: BracketFormula,
}

/// Bracket formula shape shared by the salary deduction table and the
/// life insurance tier tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BracketFormula {
    Constant { amount: Decimal },
    Linear { rate: Decimal, offset: Decimal },
}

impl BracketFormula {
    /// Evaluates the formula against an income or premium amount.
    /// Callers apply their own floor or clamp afterwards.
    pub fn apply(&self, amount: Decimal) -> Decimal {
        match self {
            Self::Constant { amount: value } => *value,
            Self::Linear { rate, offset } => amount * *rate + *offset,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PensionRule {
    pub national_pension_monthly: NationalPensionMonthly,
}

/// A `None` value with `needs_update` set means the fiscal year's
/// premium has not been published yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NationalPensionMonthly {
    pub value: Option<Decimal>,
    #[serde(default)]
    pub needs_update: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResidentTaxRule {
    pub municipality: String,
    pub income_rate: Decimal,
    pub per_capita: Decimal,
    pub basic_deduction: Option<BasicDeductionRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeparateTaxRule {
    pub stock: StockSeparateRule,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockSeparateRule {
    pub rate: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalDeductionRule {
    pub threshold_fixed: Decimal,
    pub threshold_rate: Decimal,
    pub cap: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifeInsuranceDeductionRule {
    pub national: LifeInsuranceRegimeRule,
    pub local: LifeInsuranceRegimeRule,
}

/// Per-category tier table plus the cap on the three-category sum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifeInsuranceRegimeRule {
    pub brackets: Vec<LifeInsuranceTier>,
    pub total_cap: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeInsuranceTier {
    pub max_paid: Option<Decimal>,
    pub formula: BracketFormula,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EarthquakeDeductionRule {
    pub national_cap: Decimal,
    pub local_cap: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlueDeductionRule {
    pub book: Decimal,
    pub electronic: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultsRule {
    pub si_rate: Decimal,
}
