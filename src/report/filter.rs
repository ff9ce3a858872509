use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MessError, Result};

/// The kinds of aggregate report the backend can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Inventory,
    Consumption,
    Expense,
    Menu,
    Billing,
}

impl ReportType {
    pub const ALL: [ReportType; 5] = [
        ReportType::Inventory,
        ReportType::Consumption,
        ReportType::Expense,
        ReportType::Menu,
        ReportType::Billing,
    ];

    /// Path of the aggregation endpoint, relative to the API base URL
    pub fn endpoint(self) -> &'static str {
        match self {
            ReportType::Inventory => "/mess/reports/inventory",
            ReportType::Consumption => "/mess/reports/consumption",
            ReportType::Expense => "/mess/reports/expenses",
            ReportType::Menu => "/mess/reports/menu-planning",
            ReportType::Billing => "/mess/reports/billing",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReportType::Inventory => "inventory",
            ReportType::Consumption => "consumption",
            ReportType::Expense => "expense",
            ReportType::Menu => "menu",
            ReportType::Billing => "billing",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = MessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "inventory" => Ok(ReportType::Inventory),
            "consumption" => Ok(ReportType::Consumption),
            "expense" | "expenses" => Ok(ReportType::Expense),
            "menu" | "menu-planning" => Ok(ReportType::Menu),
            "billing" | "bills" => Ok(ReportType::Billing),
            _ => Err(MessError::UnknownReportType(s.to_string())),
        }
    }
}

/// A (month, year) pair identifying a billing period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub month: u32,
    pub year: i32,
}

impl BillingPeriod {
    pub fn new(month: u32, year: i32) -> Result<Self> {
        validate_month(month)?;
        validate_year(year)?;
        Ok(Self { month, year })
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

fn validate_month(month: u32) -> Result<()> {
    if !(1..=12).contains(&month) {
        return Err(MessError::validation(
            "month",
            format!("'{month}' must be between 1 and 12"),
        ));
    }
    Ok(())
}

fn validate_year(year: i32) -> Result<()> {
    if !(2000..=2100).contains(&year) {
        return Err(MessError::validation(
            "year",
            format!("'{year}' must be between 2000 and 2100"),
        ));
    }
    Ok(())
}

/// Operator-entered report filter, validated before dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub report_type: ReportType,
    #[serde(default)]
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub meal_type: Option<String>,
    #[serde(default)]
    pub low_stock_only: bool,
}

/// A validated, ready-to-send report request
#[derive(Debug, Clone, PartialEq)]
pub struct ReportQuery {
    pub report_type: ReportType,
    pub params: Vec<(&'static str, String)>,
}

impl ReportQuery {
    pub fn endpoint(&self) -> &'static str {
        self.report_type.endpoint()
    }
}

impl ReportFilter {
    pub fn new(report_type: ReportType) -> Self {
        Self {
            report_type,
            date_range: None,
            month: None,
            year: None,
            category_id: None,
            meal_type: None,
            low_stock_only: false,
        }
    }

    /// Filter for the billing report of a period, used for refetches after bill commands
    pub fn billing(period: BillingPeriod) -> Self {
        Self {
            month: Some(period.month),
            year: Some(period.year),
            ..Self::new(ReportType::Billing)
        }
    }

    /// Check the per-type required fields and build the query parameters
    pub fn to_query(&self) -> Result<ReportQuery> {
        let mut params: Vec<(&'static str, String)> = Vec::new();

        match self.report_type {
            ReportType::Inventory => {
                if self.low_stock_only {
                    params.push(("low_stock", "true".to_string()));
                }
            }
            ReportType::Consumption | ReportType::Menu => {
                let (start, end) = self.required_range()?;
                params.push(("start_date", start.format("%Y-%m-%d").to_string()));
                params.push(("end_date", end.format("%Y-%m-%d").to_string()));
            }
            ReportType::Expense | ReportType::Billing => {
                let period = self.required_period()?;
                params.push(("month", period.month.to_string()));
                params.push(("year", period.year.to_string()));
            }
        }

        // Optional narrowing, only where the endpoint understands it
        if let Some(category) = non_blank(&self.category_id) {
            if matches!(
                self.report_type,
                ReportType::Inventory | ReportType::Consumption | ReportType::Expense
            ) {
                params.push(("category_id", category.to_string()));
            }
        }
        if let Some(meal) = non_blank(&self.meal_type) {
            if matches!(self.report_type, ReportType::Consumption | ReportType::Menu) {
                params.push(("meal_type", meal.to_string()));
            }
        }

        Ok(ReportQuery {
            report_type: self.report_type,
            params,
        })
    }

    fn required_range(&self) -> Result<(NaiveDate, NaiveDate)> {
        let (start, end) = self.date_range.ok_or_else(|| {
            MessError::validation(
                "date range",
                format!("{} reports require --from and --to", self.report_type),
            )
        })?;
        if start > end {
            return Err(MessError::validation(
                "date range",
                format!("start {start} is after end {end}"),
            ));
        }
        Ok((start, end))
    }

    fn required_period(&self) -> Result<BillingPeriod> {
        match (self.month, self.year) {
            (Some(month), Some(year)) => BillingPeriod::new(month, year),
            (None, _) => Err(MessError::validation(
                "month",
                format!("{} reports require --month", self.report_type),
            )),
            (_, None) => Err(MessError::validation(
                "year",
                format!("{} reports require --year", self.report_type),
            )),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
