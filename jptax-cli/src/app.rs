//! Command implementations behind the `jptax` binary.
//!
//! `main.rs` only parses arguments and dispatches here; everything that
//! produces output is a plain function over engine types so it can be
//! tested without a terminal.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use jptax_core::calculations::calculate_all;
use jptax_core::format::format_yen;
use jptax_core::models::{CalcLine, EngineOutput, NewSaveRecord, TaxInput};
use jptax_core::store::factory::{StoreConfig, StoreRegistry};
use jptax_core::store::repository::SnapshotStore;
use jptax_core::{rules, sample, validation};
use jptax_db_sqlite::SqliteStoreFactory;

// ─── store wiring ────────────────────────────────────────────────────────────

/// All snapshot backends this binary links in.
pub fn build_registry() -> StoreRegistry {
    let mut registry = StoreRegistry::new();
    registry.register(Arc::new(SqliteStoreFactory));
    registry
}

pub async fn connect(backend: &str, connection_string: &str) -> Result<Arc<dyn SnapshotStore>> {
    let config = StoreConfig {
        backend: backend.to_string(),
        connection_string: connection_string.to_string(),
    };
    let store = build_registry().create(&config).await?;
    Ok(store)
}

// ─── input loading ───────────────────────────────────────────────────────────

pub fn load_input(path: &Path) -> Result<TaxInput> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// Prints validation findings and fails when any error remains.
fn enforce_validation(input: &TaxInput) -> Result<()> {
    let report = validation::validate(input);
    for issue in &report.warnings {
        eprintln!("warning: {}: {}", issue.field, issue.message);
    }
    if !report.errors.is_empty() {
        for issue in &report.errors {
            eprintln!("error: {}: {}", issue.field, issue.message);
        }
        bail!(
            "input failed validation with {} error(s)",
            report.errors.len()
        );
    }
    Ok(())
}

// ─── commands ────────────────────────────────────────────────────────────────

pub fn run_years() {
    for year in rules::supported_years() {
        println!("{year}");
    }
}

pub fn run_demo(year: i32, out: Option<&Path>) -> Result<()> {
    let input = sample::demo_input(year);
    let json = serde_json::to_string_pretty(&input).context("failed to serialize demo input")?;
    match out {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub fn run_calc(path: &Path, trace: bool, json: bool, no_validate: bool) -> Result<()> {
    let input = load_input(path)?;
    if !no_validate {
        enforce_validation(&input)?;
    }

    let output = calculate_all(&input);

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }
    if trace {
        print!("{}", render_trace(&output));
        println!();
    }
    print!("{}", render_summary(&output));
    Ok(())
}

pub async fn run_save_list(store: &dyn SnapshotStore) -> Result<()> {
    let records = store.list().await?;
    if records.is_empty() {
        println!("no saved snapshots");
        return Ok(());
    }
    for record in records {
        println!(
            "{:>4}  {}  {}  {}",
            record.id,
            record.year,
            record.updated_at.format("%Y-%m-%d %H:%M:%S"),
            record.name,
        );
    }
    Ok(())
}

pub async fn run_save_create(
    store: &dyn SnapshotStore,
    path: &Path,
    name: Option<String>,
) -> Result<()> {
    let input = load_input(path)?;
    enforce_validation(&input)?;

    let output = calculate_all(&input);
    let name = match name {
        Some(name) => name,
        None => store.generate_name(input.year).await?,
    };
    let record = store
        .save(NewSaveRecord {
            year: input.year,
            name,
            input,
            summary: output.summary,
            derived: output.derived,
        })
        .await?;
    println!("saved #{}: {}", record.id, record.name);
    Ok(())
}

pub async fn run_save_rename(store: &dyn SnapshotStore, id: i64, name: &str) -> Result<()> {
    let record = store.rename(id, name).await?;
    println!("renamed #{}: {}", record.id, record.name);
    Ok(())
}

pub async fn run_save_delete(store: &dyn SnapshotStore, id: i64) -> Result<()> {
    store.delete(id).await?;
    println!("deleted #{id}");
    Ok(())
}

// ─── rendering ───────────────────────────────────────────────────────────────

pub fn render_summary(output: &EngineOutput) -> String {
    let summary = &output.summary;
    let mut text = String::new();
    text.push_str(&format!("{}年度の試算結果\n", summary.year));
    text.push_str(&format!(
        "  所得税（合計）: {}\n",
        format_yen(summary.income_tax_total)
    ));
    text.push_str(&format!(
        "  住民税（合計）: {}\n",
        format_yen(summary.resident_tax_total)
    ));
    text.push_str(&format!(
        "  株式（申告分離課税）: {}\n",
        format_yen(summary.separate_tax_stock)
    ));
    text.push_str(&format!(
        "  社会保険料控除: {}\n",
        format_yen(summary.social_insurance_deduction)
    ));
    text.push_str(&format!(
        "  ふるさと納税 寄付額上限: {}\n",
        format_yen(summary.furusato_donation_limit)
    ));
    text.push_str(&format!(
        "  採用上限（サイト比較後）: {}\n",
        format_yen(summary.adopted_limit)
    ));
    text
}

/// One row per calculation line: id, section, amount, title. Notes and
/// warnings follow indented underneath their line.
pub fn render_trace(output: &EngineOutput) -> String {
    let id_width = column_width(output, |line| line.id.chars().count());
    let section_width = column_width(output, |line| line.section.as_str().chars().count());
    let amount_width = column_width(output, |line| amount_cell(line).chars().count());

    let mut text = String::new();
    for line in &output.calc_lines {
        text.push_str(&format!(
            "{:<id_width$}  {:<section_width$}  {:>amount_width$}  {}\n",
            line.id,
            line.section.as_str(),
            amount_cell(line),
            line.title,
        ));
        for note in &line.notes {
            text.push_str(&format!("{:indent$}note: {note}\n", "", indent = id_width + 2));
        }
        for warning in &line.warnings {
            text.push_str(&format!("{:indent$}warn: {warning}\n", "", indent = id_width + 2));
        }
    }
    text
}

fn column_width(output: &EngineOutput, cell: impl Fn(&CalcLine) -> usize) -> usize {
    output.calc_lines.iter().map(cell).max().unwrap_or(0)
}

fn amount_cell(line: &CalcLine) -> String {
    match line.result {
        Some(value) => format_yen(value),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // ==================== registry ====================

    #[test]
    fn registry_links_the_sqlite_backend() {
        let registry = build_registry();

        assert_eq!(registry.available_backends(), vec!["sqlite"]);
    }

    // ==================== summary rendering ====================

    #[test]
    fn empty_summary_renders_fixed_amounts_only() {
        let output = calculate_all(&sample::empty_input(2024));

        let rendered = render_summary(&output);

        assert_eq!(
            rendered,
            concat!(
                "2024年度の試算結果\n",
                "  所得税（合計）: ￥0\n",
                "  住民税（合計）: ￥5,000\n",
                "  株式（申告分離課税）: ￥0\n",
                "  社会保険料控除: ￥0\n",
                "  ふるさと納税 寄付額上限: ￥2,000\n",
                "  採用上限（サイト比較後）: ￥2,000\n",
            )
        );
    }

    #[test]
    fn demo_summary_renders_every_headline_amount() {
        let output = calculate_all(&sample::demo_input(2024));

        let rendered = render_summary(&output);

        assert!(rendered.contains("所得税（合計）: ￥573,730"));
        assert!(rendered.contains("住民税（合計）: ￥509,600"));
        assert!(rendered.contains("株式（申告分離課税）: ￥40,630"));
        assert!(rendered.contains("社会保険料控除: ￥918,578"));
        assert!(rendered.contains("ふるさと納税 寄付額上限: ￥143,314"));
        assert!(rendered.contains("採用上限（サイト比較後）: ￥90,000"));
    }

    // ==================== trace rendering ====================

    #[test]
    fn trace_rows_keep_id_section_amount_title_order() {
        let output = calculate_all(&sample::demo_input(2024));

        let rendered = render_trace(&output);
        let first = rendered.lines().next().unwrap();

        assert!(first.starts_with("line-1 "));
        assert!(first.contains("income.salary"));
    }

    #[test]
    fn trace_includes_results_and_notes() {
        let output = calculate_all(&sample::demo_input(2024));

        let rendered = render_trace(&output);
        let general = rendered
            .lines()
            .find(|row| row.contains("所得税（総合課税）"))
            .unwrap();

        assert!(general.contains("tax.income.general"));
        assert!(general.contains("￥543,100"));
        assert!(rendered.contains("note: "));
    }

    #[test]
    fn info_lines_render_a_dash_for_the_amount() {
        let output = calculate_all(&sample::empty_input(2024));

        let rendered = render_trace(&output);
        let rule_row = rendered
            .lines()
            .find(|row| row.contains("保険料入力ルール"))
            .unwrap();

        assert!(rule_row.contains("  -  "));
    }
}
