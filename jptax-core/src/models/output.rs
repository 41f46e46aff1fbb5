use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::trace::CalcLine;

/// Headline figures for result cards and saved snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub year: i32,
    /// Income tax including the separately-taxed stock portion and the
    /// reconstruction surtax. The wire key predates that widening.
    #[serde(rename = "incomeTaxGeneral")]
    pub income_tax_total: Decimal,
    pub resident_tax_total: Decimal,
    pub separate_tax_stock: Decimal,
    pub social_insurance_deduction: Decimal,
    pub furusato_donation_limit: Decimal,
    pub adopted_limit: Decimal,
}

/// Intermediate figures other features consume: snapshot chaining,
/// comparison views, and the donation limit card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Derived {
    pub taxable_income_general: Decimal,
    pub resident_income_part: Decimal,
    pub income_tax_rate: Decimal,
    pub total_income_general: Decimal,
    pub social_insurance_total: Decimal,
    pub nhi_total: Decimal,
    pub np_total: Decimal,
    pub np_months_pay: u32,
    pub np_months_exempt: u32,
    pub furusato_donation_limit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOutput {
    pub calc_lines: Vec<CalcLine>,
    pub summary: Summary,
    pub derived: Derived,
}
