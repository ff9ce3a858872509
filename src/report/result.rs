use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ReportType;
use crate::error::{MessError, Result};

/// Backend ids arrive as either JSON strings or numbers
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string or number id, found {other}"
        ))),
    }
}

/// Stock position of a single grocery item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStock {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit: String,
    #[serde(alias = "currentStock")]
    pub current_stock: f64,
    #[serde(alias = "minimumStock")]
    pub minimum_stock: f64,
    #[serde(default, alias = "unitPrice")]
    pub unit_price: Option<f64>,
}

impl ItemStock {
    pub fn is_low(&self) -> bool {
        self.current_stock <= self.minimum_stock
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    #[serde(default)]
    pub item_stocks: Vec<ItemStock>,
    #[serde(default)]
    pub total_value: Option<f64>,
}

/// Quantity of one item consumed on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyConsumption {
    pub date: NaiveDate,
    #[serde(default, alias = "mealType")]
    pub meal_type: Option<String>,
    #[serde(alias = "itemName")]
    pub item_name: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionReport {
    #[serde(default)]
    pub daily_consumption: Vec<DailyConsumption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseByType {
    #[serde(alias = "expenseType")]
    pub expense_type: String,
    #[serde(default)]
    pub count: u32,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseReport {
    #[serde(default)]
    pub expenses_by_type: Vec<ExpenseByType>,
    #[serde(default)]
    pub total_expense: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuEntry {
    #[serde(alias = "mealType")]
    pub meal_type: String,
    #[serde(alias = "recipeName")]
    pub recipe_name: String,
    #[serde(default)]
    pub servings: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuReport {
    #[serde(default)]
    pub menu_schedules: BTreeMap<NaiveDate, Vec<MenuEntry>>,
}

impl MenuReport {
    /// Schedule entries flattened in date order
    pub fn entries(&self) -> impl Iterator<Item = (&NaiveDate, &MenuEntry)> {
        self.menu_schedules
            .iter()
            .flat_map(|(date, entries)| entries.iter().map(move |e| (date, e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Paid,
    Pending,
    Overdue,
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillStatus::Paid => write!(f, "paid"),
            BillStatus::Pending => write!(f, "pending"),
            BillStatus::Overdue => write!(f, "overdue"),
        }
    }
}

/// A student's mess charge for the billing period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentBill {
    #[serde(alias = "student_id", deserialize_with = "string_or_number")]
    pub student_id: String,
    #[serde(alias = "student_name")]
    pub student_name: String,
    #[serde(alias = "days_present")]
    pub days_present: u32,
    pub amount: f64,
    pub status: BillStatus,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingData {
    #[serde(default)]
    pub student_bills: Vec<StudentBill>,
    /// Cost of one man-day for the period
    #[serde(default)]
    pub per_day_rate: Option<f64>,
    #[serde(default)]
    pub total_man_days: Option<u32>,
    #[serde(default)]
    pub total_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingReport {
    #[serde(default)]
    pub billing_data: BillingData,
}

/// A received report payload, one variant per report type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "report_type", content = "data", rename_all = "lowercase")]
pub enum ReportResult {
    Inventory(InventoryReport),
    Consumption(ConsumptionReport),
    Expense(ExpenseReport),
    Menu(MenuReport),
    Billing(BillingReport),
}

impl ReportResult {
    /// Decode a raw payload according to the type it was requested as
    pub fn from_payload(kind: ReportType, payload: serde_json::Value) -> Result<Self> {
        let decoded = match kind {
            ReportType::Inventory => serde_json::from_value(payload).map(ReportResult::Inventory),
            ReportType::Consumption => {
                serde_json::from_value(payload).map(ReportResult::Consumption)
            }
            ReportType::Expense => serde_json::from_value(payload).map(ReportResult::Expense),
            ReportType::Menu => serde_json::from_value(payload).map(ReportResult::Menu),
            ReportType::Billing => serde_json::from_value(payload).map(ReportResult::Billing),
        };
        decoded.map_err(|source| MessError::Payload { kind, source })
    }

    pub fn report_type(&self) -> ReportType {
        match self {
            ReportResult::Inventory(_) => ReportType::Inventory,
            ReportResult::Consumption(_) => ReportType::Consumption,
            ReportResult::Expense(_) => ReportType::Expense,
            ReportResult::Menu(_) => ReportType::Menu,
            ReportResult::Billing(_) => ReportType::Billing,
        }
    }

    /// Length of the source collection the table and export are built from
    pub fn row_count(&self) -> usize {
        match self {
            ReportResult::Inventory(r) => r.item_stocks.len(),
            ReportResult::Consumption(r) => r.daily_consumption.len(),
            ReportResult::Expense(r) => r.expenses_by_type.len(),
            ReportResult::Menu(r) => r.menu_schedules.values().map(Vec::len).sum(),
            ReportResult::Billing(r) => r.billing_data.student_bills.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}
