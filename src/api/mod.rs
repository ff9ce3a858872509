mod http;

pub use http::HttpClient;

use crate::error::Result;
use crate::report::{BillingPeriod, ReportQuery};

/// Operations the mess backend exposes to the report workflow
pub trait MessApi {
    /// Read one aggregate report; the payload is returned as received
    fn fetch_report(&self, query: &ReportQuery) -> Result<serde_json::Value>;

    /// Ask the backend to compute student bills for a period
    fn generate_bills(&self, period: BillingPeriod) -> Result<()>;

    /// Ask the backend to apportion mess fees for a period
    fn allocate_fees(&self, period: BillingPeriod) -> Result<()>;
}
