use chrono::NaiveDate;
use csv::{QuoteStyle, WriterBuilder};
use log::{info, warn};
use std::fs;
use std::path::Path;

use super::{ReportFilter, ReportResult, ReportType};
use crate::error::{MessError, Result};

/// Fixed CSV column set for each report type
pub fn columns(kind: ReportType) -> &'static [&'static str] {
    match kind {
        ReportType::Inventory => &[
            "id",
            "name",
            "category",
            "unit",
            "current_stock",
            "minimum_stock",
            "unit_price",
        ],
        ReportType::Consumption => &["date", "meal_type", "item_name", "quantity", "unit", "cost"],
        ReportType::Expense => &["expense_type", "count", "amount"],
        ReportType::Menu => &["date", "meal_type", "recipe_name", "servings"],
        ReportType::Billing => &["student_id", "student_name", "days_present", "amount", "status"],
    }
}

/// File name used when no explicit output path is given
pub fn default_file_name(kind: ReportType, date: NaiveDate) -> String {
    format!("{}-report-{}.csv", kind, date.format("%Y-%m-%d"))
}

/// A CSV field. Text columns are always quoted, numeric ones never are,
/// whatever the value looks like.
enum Cell {
    Text(String),
    Number(String),
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    fn number(value: impl ToString) -> Self {
        Cell::Number(value.to_string())
    }

    fn opt_text(value: &Option<String>) -> Self {
        Cell::Text(value.clone().unwrap_or_default())
    }

    fn opt_number<T: ToString>(value: &Option<T>) -> Self {
        Cell::Number(value.as_ref().map(T::to_string).unwrap_or_default())
    }

    fn encode(&self) -> String {
        match self {
            Cell::Text(s) => format!("\"{}\"", s.replace('"', "\"\"")),
            Cell::Number(n) => n.clone(),
        }
    }
}

/// Rows of the report as displayed: inventory honours the low-stock filter
fn records(result: &ReportResult, filter: &ReportFilter) -> Vec<Vec<Cell>> {
    match result {
        ReportResult::Inventory(r) => r
            .item_stocks
            .iter()
            .filter(|i| !filter.low_stock_only || i.is_low())
            .map(|i| {
                vec![
                    Cell::text(&i.id),
                    Cell::text(&i.name),
                    Cell::opt_text(&i.category),
                    Cell::text(&i.unit),
                    Cell::number(i.current_stock),
                    Cell::number(i.minimum_stock),
                    Cell::opt_number(&i.unit_price),
                ]
            })
            .collect(),
        ReportResult::Consumption(r) => r
            .daily_consumption
            .iter()
            .map(|c| {
                vec![
                    Cell::text(c.date.to_string()),
                    Cell::opt_text(&c.meal_type),
                    Cell::text(&c.item_name),
                    Cell::number(c.quantity),
                    Cell::text(&c.unit),
                    Cell::number(format!("{:.2}", c.cost)),
                ]
            })
            .collect(),
        ReportResult::Expense(r) => r
            .expenses_by_type
            .iter()
            .map(|e| {
                vec![
                    Cell::text(&e.expense_type),
                    Cell::number(e.count),
                    Cell::number(format!("{:.2}", e.amount)),
                ]
            })
            .collect(),
        ReportResult::Menu(r) => r
            .entries()
            .map(|(date, e)| {
                vec![
                    Cell::text(date.to_string()),
                    Cell::text(&e.meal_type),
                    Cell::text(&e.recipe_name),
                    Cell::opt_number(&e.servings),
                ]
            })
            .collect(),
        ReportResult::Billing(r) => r
            .billing_data
            .student_bills
            .iter()
            .map(|b| {
                vec![
                    Cell::text(&b.student_id),
                    Cell::text(&b.student_name),
                    Cell::number(b.days_present),
                    Cell::number(format!("{:.2}", b.amount)),
                    Cell::text(b.status.to_string()),
                ]
            })
            .collect(),
    }
}

fn encode(kind: ReportType, rows: &[Vec<Cell>]) -> Result<String> {
    // Fields arrive pre-quoted, so the writer must not quote again
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .from_writer(Vec::new());
    wtr.write_record(columns(kind).iter().map(|c| Cell::text(*c).encode()))?;
    for row in rows {
        wtr.write_record(row.iter().map(Cell::encode))?;
    }

    let bytes = wtr.into_inner().map_err(|e| MessError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| MessError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Serialize the displayed rows of a result to CSV text.
/// Returns `None` when there are no rows.
pub fn to_csv(result: &ReportResult, filter: &ReportFilter) -> Result<Option<String>> {
    let rows = records(result, filter);
    if rows.is_empty() {
        return Ok(None);
    }
    encode(result.report_type(), &rows).map(Some)
}

/// Write the current report to `path`. Nothing is written when there is no
/// report or it has no rows; the number of data rows is returned otherwise.
pub fn export_csv(
    current: Option<(&ReportFilter, &ReportResult)>,
    path: &Path,
) -> Result<Option<usize>> {
    let Some((filter, result)) = current else {
        warn!("No report loaded; nothing to export");
        return Ok(None);
    };
    let rows = records(result, filter);
    if rows.is_empty() {
        warn!("{} report is empty; nothing to export", result.report_type());
        return Ok(None);
    }
    let content = encode(result.report_type(), &rows)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;

    info!("Exported {} rows to {}", rows.len(), path.display());
    Ok(Some(rows.len()))
}
