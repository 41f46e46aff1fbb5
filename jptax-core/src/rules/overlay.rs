//! Partially specified year tables and the inheritance merge.
//!
//! A table may name a parent year with `inherits_from`; missing fields
//! fall through to the parent. Merging is single level and field-wise
//! within each rule group, except `earthquake_deduction` and
//! `blue_deduction` which replace as whole tables. Bracket vectors are
//! never merged row by row.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::{
    BasicDeductionRule, BlueDeductionRule, DefaultsRule, EarthquakeDeductionRule, IncomeTaxRule,
    LifeInsuranceDeductionRule, LifeInsuranceRegimeRule, MedicalDeductionRule,
    NationalPensionMonthly, PensionRule, ResidentTaxRule, RuleYear, SalaryDeductionRule,
    SeparateTaxRule, StockSeparateRule, TaxRateRow,
};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawRuleYear {
    pub year: i32,
    pub inherits_from: Option<i32>,
    #[serde(default)]
    pub income_tax: RawIncomeTaxRule,
    #[serde(default)]
    pub pension: RawPensionRule,
    #[serde(default)]
    pub resident_tax: RawResidentTaxRule,
    #[serde(default)]
    pub separate_tax: RawSeparateTaxRule,
    #[serde(default)]
    pub medical_deduction: RawMedicalDeductionRule,
    #[serde(default)]
    pub life_insurance_deduction: RawLifeInsuranceDeductionRule,
    pub earthquake_deduction: Option<EarthquakeDeductionRule>,
    pub blue_deduction: Option<BlueDeductionRule>,
    #[serde(default)]
    pub defaults: RawDefaultsRule,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawIncomeTaxRule {
    pub rate_table: Option<Vec<TaxRateRow>>,
    pub basic_deduction: Option<BasicDeductionRule>,
    pub salary_income_deduction: Option<SalaryDeductionRule>,
    pub dependent_income_threshold: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawPensionRule {
    pub national_pension_monthly: Option<NationalPensionMonthly>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawResidentTaxRule {
    pub municipality: Option<String>,
    pub income_rate: Option<Decimal>,
    pub per_capita: Option<Decimal>,
    pub basic_deduction: Option<BasicDeductionRule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawSeparateTaxRule {
    pub stock: Option<StockSeparateRule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawMedicalDeductionRule {
    pub threshold_fixed: Option<Decimal>,
    pub threshold_rate: Option<Decimal>,
    pub cap: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawLifeInsuranceDeductionRule {
    pub national: Option<LifeInsuranceRegimeRule>,
    pub local: Option<LifeInsuranceRegimeRule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawDefaultsRule {
    pub si_rate: Option<Decimal>,
}

impl RawRuleYear {
    /// Fills this table's missing fields from `base`. The result keeps
    /// this table's year.
    pub(crate) fn merged_with(&self, base: &RawRuleYear) -> RawRuleYear {
        RawRuleYear {
            year: self.year,
            inherits_from: self.inherits_from,
            income_tax: RawIncomeTaxRule {
                rate_table: self
                    .income_tax
                    .rate_table
                    .clone()
                    .or_else(|| base.income_tax.rate_table.clone()),
                basic_deduction: self
                    .income_tax
                    .basic_deduction
                    .clone()
                    .or_else(|| base.income_tax.basic_deduction.clone()),
                salary_income_deduction: self
                    .income_tax
                    .salary_income_deduction
                    .clone()
                    .or_else(|| base.income_tax.salary_income_deduction.clone()),
                dependent_income_threshold: self
                    .income_tax
                    .dependent_income_threshold
                    .or(base.income_tax.dependent_income_threshold),
            },
            pension: RawPensionRule {
                national_pension_monthly: self
                    .pension
                    .national_pension_monthly
                    .clone()
                    .or_else(|| base.pension.national_pension_monthly.clone()),
            },
            resident_tax: RawResidentTaxRule {
                municipality: self
                    .resident_tax
                    .municipality
                    .clone()
                    .or_else(|| base.resident_tax.municipality.clone()),
                income_rate: self.resident_tax.income_rate.or(base.resident_tax.income_rate),
                per_capita: self.resident_tax.per_capita.or(base.resident_tax.per_capita),
                basic_deduction: self
                    .resident_tax
                    .basic_deduction
                    .clone()
                    .or_else(|| base.resident_tax.basic_deduction.clone()),
            },
            separate_tax: RawSeparateTaxRule {
                stock: self
                    .separate_tax
                    .stock
                    .clone()
                    .or_else(|| base.separate_tax.stock.clone()),
            },
            medical_deduction: RawMedicalDeductionRule {
                threshold_fixed: self
                    .medical_deduction
                    .threshold_fixed
                    .or(base.medical_deduction.threshold_fixed),
                threshold_rate: self
                    .medical_deduction
                    .threshold_rate
                    .or(base.medical_deduction.threshold_rate),
                cap: self.medical_deduction.cap.or(base.medical_deduction.cap),
            },
            life_insurance_deduction: RawLifeInsuranceDeductionRule {
                national: self
                    .life_insurance_deduction
                    .national
                    .clone()
                    .or_else(|| base.life_insurance_deduction.national.clone()),
                local: self
                    .life_insurance_deduction
                    .local
                    .clone()
                    .or_else(|| base.life_insurance_deduction.local.clone()),
            },
            earthquake_deduction: self
                .earthquake_deduction
                .clone()
                .or_else(|| base.earthquake_deduction.clone()),
            blue_deduction: self
                .blue_deduction
                .clone()
                .or_else(|| base.blue_deduction.clone()),
            defaults: RawDefaultsRule {
                si_rate: self.defaults.si_rate.or(base.defaults.si_rate),
            },
        }
    }

    /// Converts to a fully resolved rule. Returns the path of the first
    /// missing field if the table is still incomplete after merging.
    pub(crate) fn into_resolved(self) -> Result<RuleYear, &'static str> {
        Ok(RuleYear {
            year: self.year,
            income_tax: IncomeTaxRule {
                rate_table: self.income_tax.rate_table.ok_or("income_tax.rate_table")?,
                basic_deduction: self
                    .income_tax
                    .basic_deduction
                    .ok_or("income_tax.basic_deduction")?,
                salary_income_deduction: self
                    .income_tax
                    .salary_income_deduction
                    .ok_or("income_tax.salary_income_deduction")?,
                dependent_income_threshold: self.income_tax.dependent_income_threshold,
            },
            pension: PensionRule {
                national_pension_monthly: self
                    .pension
                    .national_pension_monthly
                    .ok_or("pension.national_pension_monthly")?,
            },
            resident_tax: ResidentTaxRule {
                municipality: self.resident_tax.municipality.ok_or("resident_tax.municipality")?,
                income_rate: self.resident_tax.income_rate.ok_or("resident_tax.income_rate")?,
                per_capita: self.resident_tax.per_capita.ok_or("resident_tax.per_capita")?,
                basic_deduction: self.resident_tax.basic_deduction,
            },
            separate_tax: SeparateTaxRule {
                stock: self.separate_tax.stock.ok_or("separate_tax.stock")?,
            },
            medical_deduction: MedicalDeductionRule {
                threshold_fixed: self
                    .medical_deduction
                    .threshold_fixed
                    .ok_or("medical_deduction.threshold_fixed")?,
                threshold_rate: self
                    .medical_deduction
                    .threshold_rate
                    .ok_or("medical_deduction.threshold_rate")?,
                cap: self.medical_deduction.cap.ok_or("medical_deduction.cap")?,
            },
            life_insurance_deduction: LifeInsuranceDeductionRule {
                national: self
                    .life_insurance_deduction
                    .national
                    .ok_or("life_insurance_deduction.national")?,
                local: self
                    .life_insurance_deduction
                    .local
                    .ok_or("life_insurance_deduction.local")?,
            },
            earthquake_deduction: self.earthquake_deduction.ok_or("earthquake_deduction")?,
            blue_deduction: self.blue_deduction.ok_or("blue_deduction")?,
            defaults: DefaultsRule {
                si_rate: self.defaults.si_rate.ok_or("defaults.si_rate")?,
            },
        })
    }
}
