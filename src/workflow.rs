use log::info;
use std::path::Path;

use crate::api::MessApi;
use crate::config::{load_view, save_view, Completion, ReportView};
use crate::error::Result;
use crate::report::{BillingPeriod, ReportFilter, ReportResult};

/// Validate `filter`, fetch the report once and store it in the view.
///
/// The view is re-read after the request returns so that a fetch started
/// meanwhile by another invocation wins over this one.
pub fn fetch_report(
    api: &impl MessApi,
    cfg_dir: &Path,
    filter: &ReportFilter,
) -> Result<(Completion, ReportView)> {
    let query = filter.to_query()?;

    let mut view = load_view(cfg_dir)?;
    let ticket = view.begin_fetch(filter);
    save_view(cfg_dir, &view)?;
    info!("Fetching {} report (#{})", filter.report_type, ticket.seq);

    let outcome = api
        .fetch_report(&query)
        .and_then(|payload| ReportResult::from_payload(filter.report_type, payload));

    let mut view = load_view(cfg_dir)?;
    let completion = view.complete(ticket, outcome)?;
    if completion == Completion::Applied {
        save_view(cfg_dir, &view)?;
    }
    Ok((completion, view))
}

/// Generate bills for a period, then refresh the billing report
pub fn generate_bills(
    api: &impl MessApi,
    cfg_dir: &Path,
    period: BillingPeriod,
) -> Result<(Completion, ReportView)> {
    api.generate_bills(period)?;
    info!("Bills generated for {}", period);
    fetch_report(api, cfg_dir, &ReportFilter::billing(period))
}

/// Allocate mess fees for a period, then refresh the billing report
pub fn allocate_fees(
    api: &impl MessApi,
    cfg_dir: &Path,
    period: BillingPeriod,
) -> Result<(Completion, ReportView)> {
    api.allocate_fees(period)?;
    info!("Fees allocated for {}", period);
    fetch_report(api, cfg_dir, &ReportFilter::billing(period))
}
