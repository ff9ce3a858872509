use chrono::NaiveDateTime;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::report::{ReportFilter, ReportResult, ReportType};

/// The operator's current report view: one result slot plus the
/// sequence counter used to tell fresh responses from stale ones.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReportView {
    #[serde(default)]
    pub report_type: Option<ReportType>,
    #[serde(default)]
    pub latest_seq: u64,
    #[serde(default)]
    pub filter: Option<ReportFilter>,
    #[serde(default)]
    pub result: Option<ReportResult>,
    #[serde(default)]
    pub fetched_at: Option<NaiveDateTime>,
}

/// Issued when a fetch starts; only the latest ticket may fill the slot
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub seq: u64,
    pub filter: ReportFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// A newer fetch was started meanwhile; the response was dropped
    Stale,
}

impl ReportView {
    /// Switch the view to `kind`, dropping whatever another type left behind
    pub fn select_type(&mut self, kind: ReportType) {
        if self.report_type != Some(kind) {
            if let Some(previous) = self.report_type {
                debug!("Report type changed from {} to {}; clearing view", previous, kind);
            }
            self.report_type = Some(kind);
            self.filter = None;
            self.result = None;
            self.fetched_at = None;
        }
    }

    pub fn begin_fetch(&mut self, filter: &ReportFilter) -> FetchTicket {
        self.select_type(filter.report_type);
        self.latest_seq += 1;
        FetchTicket {
            seq: self.latest_seq,
            filter: filter.clone(),
        }
    }

    /// Apply a finished fetch. A successful, current response replaces the
    /// slot wholesale; a failure leaves the slot as it was.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<ReportResult>,
    ) -> Result<Completion> {
        if ticket.seq != self.latest_seq {
            warn!(
                "Discarding {} response #{} (latest is #{})",
                ticket.filter.report_type, ticket.seq, self.latest_seq
            );
            return Ok(Completion::Stale);
        }

        let result = outcome?;
        self.result = Some(result);
        self.filter = Some(ticket.filter);
        self.fetched_at = Some(chrono::Local::now().naive_local());
        Ok(Completion::Applied)
    }

    pub fn current(&self) -> Option<(&ReportFilter, &ReportResult)> {
        self.filter.as_ref().zip(self.result.as_ref())
    }
}
