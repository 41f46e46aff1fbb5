use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::format::format_yen;

/// Section a calculation line belongs to. The wire form uses dotted
/// keys so downstream consumers can group and order lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Section {
    #[serde(rename = "income.salary")]
    IncomeSalary,
    #[serde(rename = "income.business")]
    IncomeBusiness,
    #[serde(rename = "income.stock.general")]
    IncomeStockGeneral,
    #[serde(rename = "income.general")]
    IncomeGeneral,
    #[serde(rename = "insurance.si")]
    InsuranceSi,
    #[serde(rename = "insurance.nhi")]
    InsuranceNhi,
    #[serde(rename = "insurance.np")]
    InsuranceNp,
    #[serde(rename = "deduction")]
    Deduction,
    #[serde(rename = "taxable")]
    Taxable,
    #[serde(rename = "tax.income")]
    TaxIncome,
    #[serde(rename = "tax.resident")]
    TaxResident,
    #[serde(rename = "tax.separate")]
    TaxSeparate,
    #[serde(rename = "furusato.limit")]
    FurusatoLimit,
    #[serde(rename = "furusato.breakdown")]
    FurusatoBreakdown,
    #[serde(rename = "diff")]
    Diff,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncomeSalary => "income.salary",
            Self::IncomeBusiness => "income.business",
            Self::IncomeStockGeneral => "income.stock.general",
            Self::IncomeGeneral => "income.general",
            Self::InsuranceSi => "insurance.si",
            Self::InsuranceNhi => "insurance.nhi",
            Self::InsuranceNp => "insurance.np",
            Self::Deduction => "deduction",
            Self::Taxable => "taxable",
            Self::TaxIncome => "tax.income",
            Self::TaxResident => "tax.resident",
            Self::TaxSeparate => "tax.separate",
            Self::FurusatoLimit => "furusato.limit",
            Self::FurusatoBreakdown => "furusato.breakdown",
            Self::Diff => "diff",
        }
    }
}

impl std::str::FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income.salary" => Ok(Self::IncomeSalary),
            "income.business" => Ok(Self::IncomeBusiness),
            "income.stock.general" => Ok(Self::IncomeStockGeneral),
            "income.general" => Ok(Self::IncomeGeneral),
            "insurance.si" => Ok(Self::InsuranceSi),
            "insurance.nhi" => Ok(Self::InsuranceNhi),
            "insurance.np" => Ok(Self::InsuranceNp),
            "deduction" => Ok(Self::Deduction),
            "taxable" => Ok(Self::Taxable),
            "tax.income" => Ok(Self::TaxIncome),
            "tax.resident" => Ok(Self::TaxResident),
            "tax.separate" => Ok(Self::TaxSeparate),
            "furusato.limit" => Ok(Self::FurusatoLimit),
            "furusato.breakdown" => Ok(Self::FurusatoBreakdown),
            "diff" => Ok(Self::Diff),
            other => Err(format!("unknown section: {other}")),
        }
    }
}

/// Whether a line carries a computed amount or is informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayKind {
    Calc,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Unit {
    Yen,
    Pct,
    Count,
    Month,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TermValue {
    Number(Decimal),
    Text(String),
}

/// One input operand of a calculation line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    pub key: Option<String>,
    pub name: String,
    pub value: TermValue,
    pub unit: Unit,
    pub display_value: Option<String>,
}

impl Term {
    pub fn yen(name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            key: None,
            name: name.into(),
            value: TermValue::Number(amount),
            unit: Unit::Yen,
            display_value: Some(format_yen(amount)),
        }
    }

    /// Rate term. Display strings vary in precision per line, so the
    /// caller formats them.
    pub fn pct(name: impl Into<String>, rate: Decimal, display: impl Into<String>) -> Self {
        Self {
            key: None,
            name: name.into(),
            value: TermValue::Number(rate),
            unit: Unit::Pct,
            display_value: Some(display.into()),
        }
    }

    pub fn count(name: impl Into<String>, n: u32) -> Self {
        Self {
            key: None,
            name: name.into(),
            value: TermValue::Number(Decimal::from(n)),
            unit: Unit::Count,
            display_value: Some(format!("{n}人")),
        }
    }

    pub fn month(name: impl Into<String>, months: u32) -> Self {
        Self {
            key: None,
            name: name.into(),
            value: TermValue::Number(Decimal::from(months)),
            unit: Unit::Month,
            display_value: Some(format!("{months}ヶ月")),
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            key: None,
            name: name.into(),
            value: TermValue::Text(value.clone()),
            unit: Unit::Text,
            display_value: Some(value),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display_value = Some(display.into());
        self
    }
}

/// One line of the audit trace. Line ids are `line-1`, `line-2`, ... in
/// emission order, fresh for every engine invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalcLine {
    pub id: String,
    pub section: Section,
    pub title: String,
    pub expression: String,
    #[serde(default)]
    pub terms: Vec<Term>,
    pub display: DisplayKind,
    pub result: Option<Decimal>,
    pub result_key: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}
