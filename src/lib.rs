pub mod api;
pub mod config;
pub mod error;
pub mod report;
pub mod workflow;

pub use api::{HttpClient, MessApi};
pub use config::{Config, ReportView};
pub use error::{MessError, Result};
pub use report::{BillingPeriod, ReportFilter, ReportResult, ReportType};
