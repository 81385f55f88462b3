//! Final summary aggregation.
//!
//! The final brief is derived from the upload, scan and DNS results. It is
//! recomputed whenever one of them changes, as soon as any of them exists.
//! Each input is sent as it is displayed: the upload as its pretty-printed
//! metadata, scan and DNS as their summary or the placeholder. Inputs that
//! have no result yet are sent as empty strings.

use crate::client::{AggregateRequest, AggregateResponse};
use crate::models::{ResultRecord, NO_SUMMARY};
use crate::pipeline::stores::ResultStore;

/// Owner of the final summary.
#[derive(Debug, Default)]
pub struct Aggregator {
    final_summary: Option<String>,
}

impl Aggregator {
    /// Build the aggregate inputs, or `None` while no feeder has a result.
    pub fn inputs(results: &ResultStore) -> Option<AggregateRequest> {
        if !results.has_feeder_result() {
            return None;
        }

        Some(Self::recompute(
            &results.upload().map(ResultRecord::raw_pretty).unwrap_or_default(),
            results.scan().map(ResultRecord::display_summary).unwrap_or(""),
            results.dns().map(ResultRecord::display_summary).unwrap_or(""),
        ))
    }

    /// Assemble an aggregate request from the three feeder summaries.
    pub fn recompute(upload_summary: &str, scan_summary: &str, dns_summary: &str) -> AggregateRequest {
        AggregateRequest {
            file_summary: upload_summary.to_string(),
            scan_summary: scan_summary.to_string(),
            dns_summary: dns_summary.to_string(),
        }
    }

    /// Overwrite the final summary with a successful response.
    pub fn apply(&mut self, response: AggregateResponse) {
        let summary = response
            .summary
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NO_SUMMARY.to_string());
        self.final_summary = Some(summary);
    }

    pub fn final_summary(&self) -> Option<&str> {
        self.final_summary.as_deref()
    }
}
