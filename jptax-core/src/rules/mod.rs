//! Compiled-in parameter tables, one JSON file per supported year.
//!
//! Tables load once into a process-wide map. A year the map does not
//! contain resolves to the [`DEFAULT_YEAR`] table so the engine always
//! has a complete rule set to work with.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//!
//! let rule = jptax_core::rules::resolve(2024);
//! assert_eq!(rule.resident_tax.per_capita, dec!(5000));
//! ```

mod overlay;

use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::warn;

use crate::models::RuleYear;
use overlay::RawRuleYear;

/// Fallback year for unknown or future years.
pub const DEFAULT_YEAR: i32 = 2024;

const TABLE_2024: &str = include_str!("tables/2024.json");
const TABLE_2025: &str = include_str!("tables/2025.json");
const TABLE_2026: &str = include_str!("tables/2026.json");
const TABLE_2027: &str = include_str!("tables/2027.json");

/// Returns the resolved rule set for `year`, falling back to
/// [`DEFAULT_YEAR`] when the year has no table.
pub fn resolve(year: i32) -> &'static RuleYear {
    let map = rule_map();
    if let Some(rule) = map.get(&year) {
        return rule;
    }
    warn!(year, fallback = DEFAULT_YEAR, "no rule table for year, using fallback");
    if let Some(rule) = map.get(&DEFAULT_YEAR) {
        return rule;
    }
    warn!("default rule table unavailable, using empty rules");
    static EMPTY: OnceLock<RuleYear> = OnceLock::new();
    EMPTY.get_or_init(RuleYear::default)
}

/// Years with a loadable table, ascending.
pub fn supported_years() -> Vec<i32> {
    let mut years: Vec<i32> = rule_map().keys().copied().collect();
    years.sort_unstable();
    years
}

fn rule_map() -> &'static HashMap<i32, RuleYear> {
    static MAP: OnceLock<HashMap<i32, RuleYear>> = OnceLock::new();
    MAP.get_or_init(build_rule_map)
}

fn build_rule_map() -> HashMap<i32, RuleYear> {
    let mut raw: HashMap<i32, RawRuleYear> = HashMap::new();
    for source in [TABLE_2024, TABLE_2025, TABLE_2026, TABLE_2027] {
        match serde_json::from_str::<RawRuleYear>(source) {
            Ok(table) => {
                raw.insert(table.year, table);
            }
            Err(err) => warn!(error = %err, "skipping unparseable rule table"),
        }
    }

    let mut resolved = HashMap::new();
    for table in raw.values() {
        let merged = match table.inherits_from {
            Some(parent_year) => match raw.get(&parent_year) {
                Some(parent) => table.merged_with(parent),
                None => {
                    warn!(
                        year = table.year,
                        parent = parent_year,
                        "rule table inherits from unknown year"
                    );
                    table.clone()
                }
            },
            None => table.clone(),
        };
        match merged.into_resolved() {
            Ok(rule) => {
                resolved.insert(rule.year, rule);
            }
            Err(missing) => {
                warn!(year = table.year, field = missing, "rule table missing required field");
            }
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tracing_subscriber::fmt::format::FmtSpan;

    use super::*;

    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_span_events(FmtSpan::NONE)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    // ==================== resolve ====================

    #[test]
    fn resolve_returns_each_year_own_pension_premium() {
        assert_eq!(
            resolve(2024).pension.national_pension_monthly.value,
            Some(dec!(16980))
        );
        assert_eq!(
            resolve(2025).pension.national_pension_monthly.value,
            Some(dec!(17510))
        );
        assert_eq!(
            resolve(2026).pension.national_pension_monthly.value,
            Some(dec!(17920))
        );
    }

    #[test]
    fn resolve_2027_pension_premium_is_unpublished() {
        let pension = &resolve(2027).pension.national_pension_monthly;

        assert_eq!(pension.value, None);
        assert!(pension.needs_update);
    }

    #[test]
    fn resolve_inherits_rate_table_from_parent_year() {
        assert_eq!(
            resolve(2025).income_tax.rate_table,
            resolve(2024).income_tax.rate_table
        );
        assert_eq!(
            resolve(2027).income_tax.rate_table,
            resolve(2024).income_tax.rate_table
        );
    }

    #[test]
    fn resolve_2024_has_no_resident_basic_deduction_table() {
        assert_eq!(resolve(2024).resident_tax.basic_deduction, None);
    }

    #[test]
    fn resolve_2025_has_resident_basic_deduction_table() {
        let table = resolve(2025)
            .resident_tax
            .basic_deduction
            .as_ref()
            .unwrap();

        assert_eq!(table.brackets.len(), 4);
        assert_eq!(table.brackets[0].deduction, dec!(430000));
    }

    #[test]
    fn resolve_unknown_year_falls_back_to_default() {
        let _guard = init_test_tracing();

        assert_eq!(resolve(1999).year, DEFAULT_YEAR);
        assert_eq!(resolve(2099).year, DEFAULT_YEAR);
    }

    // ==================== supported_years ====================

    #[test]
    fn supported_years_are_sorted_ascending() {
        assert_eq!(supported_years(), vec![2024, 2025, 2026, 2027]);
    }
}
