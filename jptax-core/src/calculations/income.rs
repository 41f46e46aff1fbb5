//! Income aggregation for the combined (progressive) base.
//!
//! Salary income comes from the per-employer gross total less the
//! formula deduction, business income from sales less expenses less the
//! blue-return deduction, and stock entries join the combined base only
//! when their tax election says so. Separately-taxed stock amounts pass
//! through untouched for the flat-rate step.

use rust_decimal::Decimal;

use crate::calculations::common::floor_yen;
use crate::calculations::recorder::TraceRecorder;
use crate::models::{BlueMode, RuleYear, Section, StockEntry, StockTaxMode, TaxInput, Term};

/// Income components the later steps consume.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeBreakdown {
    pub salary_gross: Decimal,
    pub salary_deduction: Decimal,
    pub salary_income: Decimal,
    pub business_income: Decimal,
    pub stock_general: Decimal,
    pub stock_separate_dividend: Decimal,
    pub stock_separate_gain: Decimal,
    pub total_general: Decimal,
}

pub struct IncomeAggregator<'a> {
    input: &'a TaxInput,
    rule: &'a RuleYear,
}

impl<'a> IncomeAggregator<'a> {
    pub fn new(input: &'a TaxInput, rule: &'a RuleYear) -> Self {
        Self { input, rule }
    }

    pub fn calculate(&self, trace: &mut TraceRecorder) -> IncomeBreakdown {
        let (salary_gross, salary_deduction, salary_income) = self.salary(trace);
        let business_income = self.business(trace);
        let (stock_general, stock_separate_dividend, stock_separate_gain) = self.stocks(trace);

        let total_general = salary_income + business_income + stock_general;
        trace
            .calc(Section::IncomeGeneral, "総所得（総合課税）")
            .expression("給与所得 + 事業所得 + 株式（総合）")
            .term(Term::yen("給与所得", salary_income))
            .term(Term::yen("事業所得", business_income))
            .term(Term::yen("株式（総合）", stock_general))
            .result(total_general)
            .result_key("income.general.total")
            .push();

        IncomeBreakdown {
            salary_gross,
            salary_deduction,
            salary_income,
            business_income,
            stock_general,
            stock_separate_dividend,
            stock_separate_gain,
            total_general,
        }
    }

    /// Salary gross, deduction, and net income. Sources are listed one
    /// line each; a disabled salary section zeroes the gross total.
    fn salary(&self, trace: &mut TraceRecorder) -> (Decimal, Decimal, Decimal) {
        let salary = &self.input.salary;

        let mut sum = Decimal::ZERO;
        for source in &salary.sources {
            let label = if source.name.is_empty() {
                &source.id
            } else {
                &source.name
            };
            trace
                .calc(Section::IncomeSalary, format!("給与：{label}"))
                .expression("給与収入（支払先別）")
                .result(source.annual)
                .result_key(format!("income.salary.source.{}.annual", source.id))
                .push();
            sum += source.annual;
        }

        let gross = if salary.enabled { sum } else { Decimal::ZERO };
        trace
            .calc(Section::IncomeSalary, "給与収入合計")
            .expression("sum(給与支払先 年額)")
            .result(gross)
            .result_key("income.salary.grossTotal")
            .push();

        let deduction = self.salary_deduction(gross);
        trace
            .calc(Section::IncomeSalary, "給与所得控除")
            .expression("年度ルールに従い算出（最低保障あり）")
            .term(Term::yen("給与収入合計", gross))
            .term(Term::yen(
                "最低保障額",
                self.rule.income_tax.salary_income_deduction.minimum,
            ))
            .result(deduction)
            .result_key("income.salary.deduction")
            .push();

        let income = (gross - deduction).max(Decimal::ZERO);
        trace
            .calc(Section::IncomeSalary, "給与所得")
            .expression("max(0, 給与収入合計 − 給与所得控除)")
            .term(Term::yen("給与収入合計", gross))
            .term(Term::yen("給与所得控除", deduction))
            .result(income)
            .result_key("income.salary.income")
            .push();

        (gross, deduction, income)
    }

    /// Formula deduction for a gross salary, never below the minimum
    /// guarantee. A gross with no matching bracket gets the minimum.
    fn salary_deduction(&self, gross: Decimal) -> Decimal {
        let table = &self.rule.income_tax.salary_income_deduction;
        table
            .brackets
            .iter()
            .find(|bracket| bracket.max_income.map_or(true, |max| gross <= max))
            .map(|bracket| floor_yen(bracket.formula.apply(gross)).max(table.minimum))
            .unwrap_or(table.minimum)
    }

    /// Business income: (sales − expenses) − blue-return deduction.
    /// A disabled business section contributes all zeroes.
    fn business(&self, trace: &mut TraceRecorder) -> Decimal {
        let business = &self.input.business;

        let (sales, expenses, blue_deduction, note) = if business.enabled {
            let (blue_deduction, note) = if business.blue.enabled {
                match business.blue.mode {
                    BlueMode::Electronic => {
                        (self.rule.blue_deduction.electronic, "青色方式: 電子帳簿")
                    }
                    BlueMode::Book => (self.rule.blue_deduction.book, "青色方式: 帳簿"),
                }
            } else {
                (Decimal::ZERO, "青色なし")
            };
            (business.sales, business.expenses, blue_deduction, note)
        } else {
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, "青色なし")
        };

        let income = (sales - expenses) - blue_deduction;
        trace
            .calc(Section::IncomeBusiness, "事業所得")
            .expression("(売上 − 経費) − 青色申告控除")
            .term(Term::yen("売上", sales))
            .term(Term::yen("経費", expenses))
            .term(Term::yen("青色控除", blue_deduction))
            .result(income)
            .result_key("income.business.income")
            .note(note)
            .push();

        income
    }

    /// Splits the two stock entries into the combined-base portion and
    /// the separately-taxed dividend and gain amounts.
    fn stocks(&self, trace: &mut TraceRecorder) -> (Decimal, Decimal, Decimal) {
        let stocks = &self.input.stocks;

        let split = |entry: &StockEntry| match entry.tax_mode {
            StockTaxMode::General => (entry.amount, Decimal::ZERO),
            StockTaxMode::Separate => (Decimal::ZERO, entry.amount),
        };
        let (dividend_general, dividend_separate) = split(&stocks.dividend);
        let (gain_general, gain_separate) = split(&stocks.capital_gain);

        let general = dividend_general + gain_general;
        trace
            .calc(Section::IncomeStockGeneral, "株式収入（総合課税に合算）")
            .expression("（配当：総合）＋（売買益：総合）")
            .term(Term::yen("配当（総合）", dividend_general))
            .term(Term::yen("売買益（総合）", gain_general))
            .result(general)
            .result_key("income.stock.generalIncome")
            .push();

        (general, dividend_separate, gain_separate)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{SalarySource, StockTaxMode};

    fn base_input() -> TaxInput {
        crate::sample::empty_input(2024)
    }

    fn rule() -> &'static RuleYear {
        crate::rules::resolve(2024)
    }

    fn run(input: &TaxInput) -> IncomeBreakdown {
        let mut trace = TraceRecorder::new();
        IncomeAggregator::new(input, rule()).calculate(&mut trace)
    }

    fn salary_source(id: &str, name: &str, annual: Decimal) -> SalarySource {
        SalarySource {
            id: id.into(),
            name: name.into(),
            annual,
        }
    }

    // ==================== salary ====================

    #[test]
    fn salary_income_applies_formula_deduction() {
        let mut input = base_input();
        input.salary.enabled = true;
        input.salary.sources = vec![salary_source("src-a", "支払先A", dec!(4000000))];
        input.salary.main_source_id = Some("src-a".into());

        let breakdown = run(&input);

        assert_eq!(breakdown.salary_gross, dec!(4000000));
        assert_eq!(breakdown.salary_deduction, dec!(1240000));
        assert_eq!(breakdown.salary_income, dec!(2760000));
    }

    #[test]
    fn salary_deduction_never_drops_below_minimum() {
        let mut input = base_input();
        input.salary.enabled = true;
        input.salary.sources = vec![salary_source("src-a", "支払先A", dec!(300000))];
        input.salary.main_source_id = Some("src-a".into());

        let breakdown = run(&input);

        assert_eq!(breakdown.salary_deduction, dec!(550000));
        assert_eq!(breakdown.salary_income, dec!(0));
    }

    #[test]
    fn salary_deduction_caps_at_top_bracket() {
        let mut input = base_input();
        input.salary.enabled = true;
        input.salary.sources = vec![salary_source("src-a", "支払先A", dec!(20000000))];
        input.salary.main_source_id = Some("src-a".into());

        let breakdown = run(&input);

        assert_eq!(breakdown.salary_deduction, dec!(1950000));
    }

    #[test]
    fn disabled_salary_zeroes_gross_total() {
        let mut input = base_input();
        input.salary.enabled = false;
        input.salary.sources = vec![salary_source("src-a", "支払先A", dec!(4000000))];

        let breakdown = run(&input);

        assert_eq!(breakdown.salary_gross, dec!(0));
        assert_eq!(breakdown.salary_income, dec!(0));
    }

    #[test]
    fn salary_sources_each_get_a_trace_line() {
        let mut input = base_input();
        input.salary.enabled = true;
        input.salary.sources = vec![
            salary_source("src-a", "支払先A", dec!(4000000)),
            salary_source("src-b", "", dec!(1200000)),
        ];
        input.salary.main_source_id = Some("src-a".into());

        let mut trace = TraceRecorder::new();
        IncomeAggregator::new(&input, rule()).calculate(&mut trace);
        let lines = trace.into_lines();

        assert_eq!(lines[0].title, "給与：支払先A");
        // Nameless sources fall back to the id.
        assert_eq!(lines[1].title, "給与：src-b");
        assert_eq!(
            lines[1].result_key.as_deref(),
            Some("income.salary.source.src-b.annual")
        );
    }

    // ==================== business ====================

    #[test]
    fn business_income_subtracts_electronic_blue_deduction() {
        let mut input = base_input();
        input.business.enabled = true;
        input.business.sales = dec!(5000000);
        input.business.expenses = dec!(1200000);
        input.business.blue.enabled = true;
        input.business.blue.mode = BlueMode::Electronic;

        let breakdown = run(&input);

        assert_eq!(breakdown.business_income, dec!(3150000));
    }

    #[test]
    fn business_income_subtracts_book_blue_deduction() {
        let mut input = base_input();
        input.business.enabled = true;
        input.business.sales = dec!(5000000);
        input.business.expenses = dec!(1200000);
        input.business.blue.enabled = true;
        input.business.blue.mode = BlueMode::Book;

        let breakdown = run(&input);

        assert_eq!(breakdown.business_income, dec!(3250000));
    }

    #[test]
    fn business_without_blue_return_notes_it() {
        let mut input = base_input();
        input.business.enabled = true;
        input.business.sales = dec!(5000000);
        input.business.expenses = dec!(1200000);

        let mut trace = TraceRecorder::new();
        let breakdown = IncomeAggregator::new(&input, rule()).calculate(&mut trace);

        assert_eq!(breakdown.business_income, dec!(3800000));
        let line = trace
            .into_lines()
            .into_iter()
            .find(|l| l.result_key.as_deref() == Some("income.business.income"))
            .unwrap();
        assert_eq!(line.notes, vec!["青色なし"]);
    }

    #[test]
    fn disabled_business_contributes_nothing() {
        let mut input = base_input();
        input.business.enabled = false;
        input.business.sales = dec!(5000000);

        let breakdown = run(&input);

        assert_eq!(breakdown.business_income, dec!(0));
    }

    // ==================== stocks ====================

    #[test]
    fn stock_entries_split_by_tax_election() {
        let mut input = base_input();
        input.stocks.dividend.amount = dec!(80000);
        input.stocks.dividend.tax_mode = StockTaxMode::General;
        input.stocks.capital_gain.amount = dec!(200000);
        input.stocks.capital_gain.tax_mode = StockTaxMode::Separate;

        let breakdown = run(&input);

        assert_eq!(breakdown.stock_general, dec!(80000));
        assert_eq!(breakdown.stock_separate_dividend, dec!(0));
        assert_eq!(breakdown.stock_separate_gain, dec!(200000));
    }

    // ==================== total ====================

    #[test]
    fn total_general_adds_all_combined_components() {
        let mut input = base_input();
        input.salary.enabled = true;
        input.salary.sources = vec![
            salary_source("src-a", "支払先A", dec!(4000000)),
            salary_source("src-b", "支払先B", dec!(1200000)),
        ];
        input.salary.main_source_id = Some("src-a".into());
        input.business.enabled = true;
        input.business.sales = dec!(5000000);
        input.business.expenses = dec!(1200000);
        input.business.blue.enabled = true;
        input.business.blue.mode = BlueMode::Electronic;
        input.stocks.dividend.amount = dec!(80000);

        let breakdown = run(&input);

        // 5.2M gross gives a 1.48M deduction, so salary income is 3.72M.
        assert_eq!(breakdown.salary_income, dec!(3720000));
        assert_eq!(breakdown.total_general, dec!(6950000));
    }
}
