mod export;
mod filter;
mod render;
mod result;

pub use export::{columns, default_file_name, export_csv, to_csv};
pub use filter::{BillingPeriod, ReportFilter, ReportQuery, ReportType};
pub use render::{format_amount, render, ChartSeries, RenderModel};
pub use result::{
    BillStatus, BillingData, BillingReport, ConsumptionReport, DailyConsumption, ExpenseByType,
    ExpenseReport, InventoryReport, ItemStock, MenuEntry, MenuReport, ReportResult, StudentBill,
};
