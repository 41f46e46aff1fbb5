mod input;
mod output;
mod rules;
mod snapshot;
mod trace;

pub use input::{
    BlueMode, BlueReturn, BusinessInput, ComparisonSite, DeductionInput, EmployeeInsurance,
    EmployeeSubPeriod, FamilyInput, InputMode, InsuranceInput, InsuranceMode, LifeInsurancePaid,
    MedicalInput, MixedBlock, MixedInsurance, NationalInsurance, NhiConfig, NhiHousehold,
    NhiSubPeriod, NpConfig, OverrideInput, PreviousYearInputMode, SalaryInput, SalarySource,
    SaveReference, StockEntry, StockInput, StockTaxMode, TaxInput,
};
pub use output::{Derived, EngineOutput, Summary};
pub use rules::{
    BasicDeductionBracket, BasicDeductionRule, BlueDeductionRule, BracketFormula, DefaultsRule,
    EarthquakeDeductionRule, IncomeTaxRule, LifeInsuranceDeductionRule, LifeInsuranceRegimeRule,
    LifeInsuranceTier, MedicalDeductionRule, NationalPensionMonthly, PensionRule, ResidentTaxRule,
    RuleYear, SalaryDeductionBracket, SalaryDeductionRule, SeparateTaxRule, StockSeparateRule,
    TaxRateRow,
};
pub use snapshot::{NewSaveRecord, SaveRecord, SCHEMA_VERSION};
pub use trace::{CalcLine, DisplayKind, Section, Term, TermValue, Unit};
