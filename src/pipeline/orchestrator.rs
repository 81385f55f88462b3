//! The dependency graph between user input, backend calls and results.
//!
//! The orchestrator is a pure state machine: [`Orchestrator::submit`] reacts
//! to user input and [`Orchestrator::complete`] reacts to backend responses.
//! Both return the backend calls that must be issued next; nothing here
//! performs IO. Each call carries a [`Ticket`], and a response is applied
//! only while its ticket is still the latest of its group.

use crate::client::{
    AggregateRequest, AggregateResponse, ClientError, DnsQuery, ReputationResponse,
    SummarizeRequest, SummarizeResponse, UploadRequest, UploadResponse,
};
use crate::models::{
    Field, Group, PipelineStats, ResultRecord, ScanQuery, SelectedFile, Snapshot, SummarySource,
};
use crate::pipeline::aggregator::Aggregator;
use crate::pipeline::fence::{Fence, Ticket};
use crate::pipeline::stores::{ErrorChannel, IndicatorStore, ResultStore};
use tracing::{debug, info, warn};

/// A user action.
#[derive(Debug, Clone)]
pub enum Input {
    /// Overwrite a text field.
    Edit { field: Field, value: String },
    /// Choose a file. Passive: nothing is sent until `Upload`.
    SelectFile(SelectedFile),
    /// Send the selected file for metadata extraction.
    Upload,
    /// Summarize the free-text field.
    Summarize,
}

/// A backend call to issue.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Summarize(SummarizeRequest),
    Scan(ScanQuery),
    Dns(DnsQuery),
    Upload(UploadRequest),
    Aggregate(AggregateRequest),
}

impl Call {
    pub fn group(&self) -> Group {
        match self {
            Call::Summarize(_) => Group::Gpt,
            Call::Scan(_) => Group::Scan,
            Call::Dns(_) => Group::Dns,
            Call::Upload(_) => Group::Upload,
            Call::Aggregate(_) => Group::Aggregate,
        }
    }
}

/// A call together with the ticket its response must present.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub ticket: Ticket,
    pub call: Call,
}

/// Outcome of a backend call.
#[derive(Debug, Clone)]
pub enum Completion {
    Summarize(Result<SummarizeResponse, ClientError>),
    Scan(Result<ReputationResponse, ClientError>),
    Dns(Result<ReputationResponse, ClientError>),
    Upload(Result<UploadResponse, ClientError>),
    Aggregate(Result<AggregateResponse, ClientError>),
}

impl Completion {
    /// A failed outcome for `group`.
    pub fn failed(group: Group, error: ClientError) -> Self {
        match group {
            Group::Gpt => Completion::Summarize(Err(error)),
            Group::Scan => Completion::Scan(Err(error)),
            Group::Dns => Completion::Dns(Err(error)),
            Group::Upload => Completion::Upload(Err(error)),
            Group::Aggregate => Completion::Aggregate(Err(error)),
        }
    }

    pub fn group(&self) -> Group {
        match self {
            Completion::Summarize(_) => Group::Gpt,
            Completion::Scan(_) => Group::Scan,
            Completion::Dns(_) => Group::Dns,
            Completion::Upload(_) => Group::Upload,
            Completion::Aggregate(_) => Group::Aggregate,
        }
    }
}

/// Owns all pipeline state.
#[derive(Debug, Default)]
pub struct Orchestrator {
    indicators: IndicatorStore,
    results: ResultStore,
    aggregator: Aggregator,
    errors: ErrorChannel,
    fence: Fence,
    stats: PipelineStats,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a user action and return the calls it triggers.
    pub fn submit(&mut self, input: Input) -> Vec<Dispatch> {
        match input {
            Input::Edit { field, value } => {
                self.indicators.set(field, value);
                self.react_to_edit(field).into_iter().collect()
            }
            Input::SelectFile(file) => {
                self.indicators.select_file(file);
                Vec::new()
            }
            Input::Upload => {
                let request = match self.indicators.file() {
                    Some(file) => UploadRequest {
                        file_name: file.name.clone(),
                        bytes: file.bytes.clone(),
                    },
                    None => {
                        self.fence.reject(Group::Upload);
                        self.errors.fail(Group::Upload, "No file selected");
                        return Vec::new();
                    }
                };
                vec![self.dispatch(Call::Upload(request))]
            }
            Input::Summarize => {
                let text = self.indicators.get(Field::Text).to_string();
                vec![self.dispatch(Call::Summarize(SummarizeRequest { text }))]
            }
        }
    }

    fn react_to_edit(&mut self, field: Field) -> Option<Dispatch> {
        match field.trigger()? {
            Group::Scan => {
                let query = self.indicators.scan_query()?;
                Some(self.dispatch(Call::Scan(query)))
            }
            Group::Dns => {
                let domain = self.indicators.get(Field::Domain);
                if domain.is_empty() {
                    return None;
                }
                let query = DnsQuery {
                    domain: domain.to_string(),
                };
                Some(self.dispatch(Call::Dns(query)))
            }
            _ => None,
        }
    }

    /// Apply a backend outcome and return the calls it triggers.
    pub fn complete(&mut self, ticket: Ticket, completion: Completion) -> Vec<Dispatch> {
        if ticket.group != completion.group() {
            warn!(
                "Ignoring {} response delivered with a {} ticket",
                completion.group(),
                ticket.group
            );
            return Vec::new();
        }

        if !self.fence.is_current(ticket) {
            self.stats.discarded += 1;
            debug!(
                "Discarding stale {} response (generation {}, latest {})",
                ticket.group,
                ticket.generation,
                self.fence.latest(ticket.group)
            );
            return Vec::new();
        }

        self.stats.applied += 1;

        match completion {
            Completion::Summarize(Ok(response)) => {
                self.results.show_summary(SummarySource::Gpt, response.result);
                self.settle(ticket, response.error);
                Vec::new()
            }
            Completion::Scan(Ok(response)) => {
                let record = ResultRecord::new(response.result, response.summary, response.error);
                let error = record.error.clone();
                let changed = self.results.set_scan(record);
                self.settle(ticket, error);
                self.refresh_aggregate(changed)
            }
            Completion::Dns(Ok(response)) => {
                let record = ResultRecord::new(response.result, response.summary, response.error);
                let error = record.error.clone();
                let changed = self.results.set_dns(record);
                self.settle(ticket, error);
                self.refresh_aggregate(changed)
            }
            Completion::Upload(Ok(response)) => {
                let record =
                    ResultRecord::new(response.metadata, response.metadata_summary, response.error);
                if let Some(summary) = &record.summary {
                    self.results
                        .show_summary(SummarySource::UploadMetadata, summary.clone());
                }
                let error = record.error.clone();
                let changed = self.results.set_upload(record);
                self.settle(ticket, error);
                self.refresh_aggregate(changed)
            }
            Completion::Aggregate(Ok(response)) => {
                self.aggregator.apply(response);
                self.settle(ticket, None);
                Vec::new()
            }
            Completion::Summarize(Err(e))
            | Completion::Scan(Err(e))
            | Completion::Dns(Err(e))
            | Completion::Upload(Err(e))
            | Completion::Aggregate(Err(e)) => {
                if e.is_transport() {
                    debug!("{} call did not reach the service layer", ticket.group);
                }
                let message = format!("Error fetching {}: {}", ticket.group, e);
                self.settle(ticket, Some(message));
                Vec::new()
            }
        }
    }

    /// Record a group outcome in the fence and the error channel.
    fn settle(&mut self, ticket: Ticket, error: Option<String>) {
        match error {
            Some(message) => {
                self.fence.settle(ticket, false);
                self.errors.fail(ticket.group, message);
            }
            None => {
                self.fence.settle(ticket, true);
                self.errors.succeed(ticket.group);
            }
        }
    }

    fn refresh_aggregate(&mut self, changed: bool) -> Vec<Dispatch> {
        if !changed {
            debug!("Feeder result unchanged; final summary not recomputed");
            return Vec::new();
        }

        match Aggregator::inputs(&self.results) {
            Some(request) => vec![self.dispatch(Call::Aggregate(request))],
            None => Vec::new(),
        }
    }

    fn dispatch(&mut self, call: Call) -> Dispatch {
        let ticket = self.fence.issue(call.group());
        self.stats.issued += 1;
        info!("Issuing {} request #{}", ticket.group, ticket.generation);
        debug!("Request payload: {:?}", call);

        Dispatch { ticket, call }
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Copy of everything currently shown.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            indicators: self.indicators.snapshot(),
            displayed_summary: self.results.displayed_summary().cloned(),
            scan: self.results.scan().cloned(),
            dns: self.results.dns().cloned(),
            upload: self.results.upload().cloned(),
            final_summary: self.aggregator.final_summary().map(String::from),
            error: self.errors.current().map(String::from),
            errors_by_group: self.errors.by_group().clone(),
            groups: Group::ALL
                .iter()
                .map(|g| (*g, self.fence.state(*g)))
                .collect(),
        }
    }
}
