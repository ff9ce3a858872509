use std::collections::BTreeMap;

use super::{ReportFilter, ReportResult, ReportType};

/// One labelled data series for a chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<(String, f64)>,
}

/// Chart-ready series plus table rows for one report
#[derive(Debug, Clone, PartialEq)]
pub struct RenderModel {
    pub title: String,
    pub series: Vec<ChartSeries>,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
    /// Set when there is nothing to show; callers render it in place of the table
    pub empty_message: Option<String>,
    pub summary: Vec<(String, String)>,
}

impl RenderModel {
    pub fn is_empty(&self) -> bool {
        self.empty_message.is_some()
    }
}

/// Build the render model for a result as requested by `filter`
pub fn render(result: &ReportResult, filter: &ReportFilter) -> RenderModel {
    let mut model = match result {
        ReportResult::Inventory(report) => {
            let items: Vec<_> = report
                .item_stocks
                .iter()
                .filter(|item| !filter.low_stock_only || item.is_low())
                .collect();
            let mut summary = vec![("Items".to_string(), items.len().to_string())];
            if let Some(value) = report.total_value {
                summary.push(("Stock value".to_string(), format_amount(value)));
            }
            RenderModel {
                title: if filter.low_stock_only {
                    "Inventory (low stock)".to_string()
                } else {
                    "Inventory".to_string()
                },
                series: vec![ChartSeries {
                    label: "Current stock".to_string(),
                    points: items
                        .iter()
                        .map(|item| (item.name.clone(), item.current_stock))
                        .collect(),
                }],
                columns: vec!["ITEM", "CATEGORY", "CURRENT", "MINIMUM", "UNIT", "STATUS"],
                rows: items
                    .iter()
                    .map(|item| {
                        vec![
                            item.name.clone(),
                            item.category.clone().unwrap_or_else(|| "-".to_string()),
                            format_quantity(item.current_stock),
                            format_quantity(item.minimum_stock),
                            item.unit.clone(),
                            if item.is_low() { "LOW" } else { "OK" }.to_string(),
                        ]
                    })
                    .collect(),
                empty_message: None,
                summary,
            }
        }
        ReportResult::Consumption(report) => {
            let mut cost_per_day: BTreeMap<String, f64> = BTreeMap::new();
            for row in &report.daily_consumption {
                *cost_per_day.entry(row.date.to_string()).or_default() += row.cost;
            }
            let total: f64 = report.daily_consumption.iter().map(|r| r.cost).sum();
            RenderModel {
                title: "Daily consumption".to_string(),
                series: vec![ChartSeries {
                    label: "Cost per day".to_string(),
                    points: cost_per_day.into_iter().collect(),
                }],
                columns: vec!["DATE", "MEAL", "ITEM", "QUANTITY", "UNIT", "COST"],
                rows: report
                    .daily_consumption
                    .iter()
                    .map(|row| {
                        vec![
                            row.date.to_string(),
                            row.meal_type.clone().unwrap_or_else(|| "-".to_string()),
                            row.item_name.clone(),
                            format_quantity(row.quantity),
                            row.unit.clone(),
                            format_amount(row.cost),
                        ]
                    })
                    .collect(),
                empty_message: None,
                summary: vec![("Total cost".to_string(), format_amount(total))],
            }
        }
        ReportResult::Expense(report) => {
            let total = report
                .total_expense
                .unwrap_or_else(|| report.expenses_by_type.iter().map(|e| e.amount).sum());
            RenderModel {
                title: "Expenses by type".to_string(),
                series: vec![ChartSeries {
                    label: "Amount".to_string(),
                    points: report
                        .expenses_by_type
                        .iter()
                        .map(|e| (e.expense_type.clone(), e.amount))
                        .collect(),
                }],
                columns: vec!["TYPE", "ENTRIES", "AMOUNT"],
                rows: report
                    .expenses_by_type
                    .iter()
                    .map(|e| {
                        vec![
                            e.expense_type.clone(),
                            e.count.to_string(),
                            format_amount(e.amount),
                        ]
                    })
                    .collect(),
                empty_message: None,
                summary: vec![("Total expense".to_string(), format_amount(total))],
            }
        }
        ReportResult::Menu(report) => RenderModel {
            title: "Menu plan".to_string(),
            series: vec![ChartSeries {
                label: "Planned servings".to_string(),
                points: report
                    .menu_schedules
                    .iter()
                    .map(|(date, entries)| {
                        let servings: u32 = entries.iter().filter_map(|e| e.servings).sum();
                        (date.to_string(), servings as f64)
                    })
                    .collect(),
            }],
            columns: vec!["DATE", "MEAL", "RECIPE", "SERVINGS"],
            rows: report
                .entries()
                .map(|(date, entry)| {
                    vec![
                        date.to_string(),
                        entry.meal_type.clone(),
                        entry.recipe_name.clone(),
                        entry
                            .servings
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    ]
                })
                .collect(),
            empty_message: None,
            summary: vec![("Days planned".to_string(), report.menu_schedules.len().to_string())],
        },
        ReportResult::Billing(report) => {
            let data = &report.billing_data;
            let total = data
                .total_amount
                .unwrap_or_else(|| data.student_bills.iter().map(|b| b.amount).sum());
            let mut summary = vec![
                ("Students".to_string(), data.student_bills.len().to_string()),
                ("Total billed".to_string(), format_amount(total)),
            ];
            if let Some(rate) = data.per_day_rate {
                summary.push(("Per man-day".to_string(), format_amount(rate)));
            }
            if let Some(days) = data.total_man_days {
                summary.push(("Man-days".to_string(), days.to_string()));
            }
            RenderModel {
                title: "Student bills".to_string(),
                series: vec![ChartSeries {
                    label: "Amount".to_string(),
                    points: data
                        .student_bills
                        .iter()
                        .map(|b| (b.student_name.clone(), b.amount))
                        .collect(),
                }],
                columns: vec!["STUDENT", "NAME", "DAYS", "AMOUNT", "STATUS"],
                rows: data
                    .student_bills
                    .iter()
                    .map(|b| {
                        vec![
                            b.student_id.clone(),
                            b.student_name.clone(),
                            b.days_present.to_string(),
                            format_amount(b.amount),
                            b.status.to_string().to_uppercase(),
                        ]
                    })
                    .collect(),
                empty_message: None,
                summary,
            }
        }
    };

    if model.rows.is_empty() {
        model.series.clear();
        model.empty_message = Some(empty_message(result.report_type(), filter));
    }
    model
}

fn empty_message(kind: ReportType, filter: &ReportFilter) -> String {
    match kind {
        ReportType::Inventory if filter.low_stock_only => "No items are low on stock.".to_string(),
        ReportType::Inventory => "No inventory items found.".to_string(),
        ReportType::Consumption => "No consumption recorded for this period.".to_string(),
        ReportType::Expense => "No expenses recorded for this period.".to_string(),
        ReportType::Menu => "No menu scheduled for this period.".to_string(),
        ReportType::Billing => "No bills generated for this period.".to_string(),
    }
}

fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Format a money amount with two decimals and thousands separators
pub fn format_amount(value: f64) -> String {
    let rounded = format!("{:.2}", value.abs());
    let (whole, frac) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if value < 0.0 && rounded != "0.00" {
        format!("-{grouped}.{frac}")
    } else {
        format!("{grouped}.{frac}")
    }
}
