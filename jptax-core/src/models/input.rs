use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Full declared state of one taxpayer for one fiscal year.
///
/// Field names serialize in camelCase for compatibility with schema
/// version 1 snapshot records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxInput {
    pub year: i32,
    pub family: FamilyInput,
    pub salary: SalaryInput,
    pub business: BusinessInput,
    pub stocks: StockInput,
    pub deductions: DeductionInput,
    pub insurance: InsuranceInput,
    pub overrides: OverrideInput,
    pub comparison_sites: Vec<ComparisonSite>,
    pub save: SaveReference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyInput {
    pub age: u32,
    pub spouse: u32,
    pub dependent_count: u32,
    pub dependents_40_64_count: u32,
    pub preschool_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryInput {
    pub enabled: bool,
    pub sources: Vec<SalarySource>,
    pub main_source_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalarySource {
    pub id: String,
    pub name: String,
    pub annual: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessInput {
    pub enabled: bool,
    pub sales: Decimal,
    pub expenses: Decimal,
    pub blue: BlueReturn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueReturn {
    pub enabled: bool,
    pub mode: BlueMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlueMode {
    Electronic,
    Book,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInput {
    pub dividend: StockEntry,
    pub capital_gain: StockEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockEntry {
    pub amount: Decimal,
    pub tax_mode: StockTaxMode,
}

/// Taxation election for one stock income entry: combined with the
/// progressive total, or flat-rate separate taxation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StockTaxMode {
    General,
    Separate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionInput {
    pub ideco: Decimal,
    pub small_biz_mutual_aid: Decimal,
    pub safety_mutual_aid: Decimal,
    pub life_insurance: LifeInsurancePaid,
    pub earthquake_paid: Decimal,
    pub medical: MedicalInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeInsurancePaid {
    pub general: Decimal,
    pub nursing_medical: Decimal,
    pub pension: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalInput {
    pub enabled: bool,
    pub treatment: Decimal,
    pub transport: Decimal,
    pub other: Decimal,
    pub reimbursed: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceInput {
    pub mode: InsuranceMode,
    pub employee: Option<EmployeeInsurance>,
    pub national: Option<NationalInsurance>,
    pub mixed: Option<MixedInsurance>,
    pub household: NhiHousehold,
}

/// Enrollment topology for the fiscal year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InsuranceMode {
    EmployeeOnly,
    NationalOnly,
    Mixed,
}

/// Hand-entered amount versus formula estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputMode {
    Manual,
    Estimate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInsurance {
    pub input_mode: InputMode,
    pub amount: Option<Decimal>,
    pub base_salary_manual: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NationalInsurance {
    pub nhi: NhiConfig,
    pub np: NpConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NhiConfig {
    pub mode: InputMode,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NpConfig {
    pub pay_months: u32,
    pub exempt_months: u32,
    pub monthly_override: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixedInsurance {
    pub blocks: Vec<MixedBlock>,
}

/// One enrollment period of a year split between schemes.
///
/// Block months must sum to twelve across the year; the input validator
/// enforces that, not the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MixedBlock {
    #[serde(rename_all = "camelCase")]
    Employee {
        id: String,
        months: u32,
        breakdown: Vec<EmployeeSubPeriod>,
    },
    #[serde(rename_all = "camelCase")]
    National {
        id: String,
        months: u32,
        nhi_breakdown: Vec<NhiSubPeriod>,
        np_pay_months: u32,
        np_exempt_months: u32,
        np_monthly_override: Option<Decimal>,
    },
}

impl MixedBlock {
    pub fn months(&self) -> u32 {
        match self {
            Self::Employee { months, .. } => *months,
            Self::National { months, .. } => *months,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSubPeriod {
    pub id: String,
    pub mode: InputMode,
    pub months: u32,
    pub amount: Option<Decimal>,
    pub base_salary_source_id: Option<String>,
    pub base_salary_manual: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NhiSubPeriod {
    pub id: String,
    pub mode: InputMode,
    pub months: u32,
    pub amount: Option<Decimal>,
}

/// Household composition for national health insurance, taxpayer included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NhiHousehold {
    pub members: u32,
    pub members_40_64: u32,
    pub preschool: u32,
}

/// Optional rate overrides. `None` means the year rule's value applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideInput {
    pub income_tax_rate: Option<Decimal>,
    pub resident_income_rate: Option<Decimal>,
    pub separate_tax_rate: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSite {
    pub id: String,
    pub name: String,
    pub amount: Decimal,
}

/// Previous-year income reference.
///
/// `previous_year_total_income` is the single resolved figure the engine
/// consumes; callers resolve it from a stored snapshot, the current-year
/// total, or a manual entry according to `previous_year_input_mode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReference {
    pub selected_save_id: Option<String>,
    pub previous_year_total_income: Option<Decimal>,
    pub previous_year_input_mode: PreviousYearInputMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PreviousYearInputMode {
    None,
    FromSave,
    UseCurrent,
    Manual,
}
