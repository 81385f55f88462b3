//! Async driver for the orchestrator.
//!
//! Backend calls run as tokio tasks that only produce a [`Completion`]; the
//! owner of the [`Pipeline`] applies completions one at a time, so state is
//! never touched concurrently. A newer request of a group may abort the
//! group's previous in-flight task.

use crate::client::{Backend, ClientError};
use crate::config::PipelineConfig;
use crate::models::{Group, PipelineStats, Snapshot};
use crate::pipeline::fence::Ticket;
use crate::pipeline::orchestrator::{Call, Completion, Dispatch, Input, Orchestrator};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::{AbortHandle, Id, JoinSet};
use tracing::{debug, warn};

/// Runtime behaviour switches.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Abort a group's in-flight task when a newer request supersedes it.
    pub abort_superseded: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            abort_superseded: true,
        }
    }
}

impl From<&PipelineConfig> for PipelineOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            abort_superseded: config.abort_superseded,
        }
    }
}

/// An orchestrator wired to a backend.
pub struct Pipeline {
    orchestrator: Orchestrator,
    backend: Arc<dyn Backend>,
    options: PipelineOptions,
    tasks: JoinSet<(Ticket, Completion)>,
    tickets: HashMap<Id, Ticket>,
    running: [Option<AbortHandle>; Group::COUNT],
}

impl Pipeline {
    pub fn new(backend: Arc<dyn Backend>, options: PipelineOptions) -> Self {
        Self {
            orchestrator: Orchestrator::new(),
            backend,
            options,
            tasks: JoinSet::new(),
            tickets: HashMap::new(),
            running: Default::default(),
        }
    }

    /// Apply a user action and start the calls it triggers.
    pub fn submit(&mut self, input: Input) {
        let dispatches = self.orchestrator.submit(input);
        self.spawn_all(dispatches);
    }

    /// Number of backend tasks not yet joined.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for the next backend task to finish. Aborted tasks are skipped;
    /// a panicked task completes its ticket as a transport failure.
    ///
    /// Returns `None` once nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<(Ticket, Completion)> {
        while let Some(joined) = self.tasks.join_next_with_id().await {
            match joined {
                Ok((id, done)) => {
                    self.tickets.remove(&id);
                    return Some(done);
                }
                Err(e) => {
                    let ticket = self.tickets.remove(&e.id());
                    if e.is_cancelled() {
                        debug!("Superseded request aborted");
                        continue;
                    }

                    warn!("Backend task panicked: {}", e);
                    if let Some(ticket) = ticket {
                        let error = ClientError::Transport(format!("backend task panicked: {}", e));
                        return Some((ticket, Completion::failed(ticket.group, error)));
                    }
                }
            }
        }
        None
    }

    /// Apply a finished call and start whatever it triggers.
    pub fn apply(&mut self, ticket: Ticket, completion: Completion) {
        let dispatches = self.orchestrator.complete(ticket, completion);
        self.spawn_all(dispatches);
    }

    /// Apply one completion. Returns `false` when nothing was in flight.
    pub async fn step(&mut self) -> bool {
        match self.next_completion().await {
            Some((ticket, completion)) => {
                self.apply(ticket, completion);
                true
            }
            None => false,
        }
    }

    /// Run until no backend call is in flight, follow-up calls included.
    pub async fn settle(&mut self) {
        while self.step().await {}
    }

    pub fn snapshot(&self) -> Snapshot {
        self.orchestrator.snapshot()
    }

    pub fn stats(&self) -> PipelineStats {
        self.orchestrator.stats()
    }

    fn spawn_all(&mut self, dispatches: Vec<Dispatch>) {
        for dispatch in dispatches {
            self.spawn(dispatch);
        }
    }

    fn spawn(&mut self, dispatch: Dispatch) {
        let Dispatch { ticket, call } = dispatch;
        let backend = Arc::clone(&self.backend);

        let handle = self.tasks.spawn(async move {
            let completion = execute(backend.as_ref(), call).await;
            (ticket, completion)
        });
        self.tickets.insert(handle.id(), ticket);

        if let Some(previous) = self.running[ticket.group.index()].replace(handle) {
            if self.options.abort_superseded && !previous.is_finished() {
                debug!("Aborting superseded {} request", ticket.group);
                previous.abort();
            }
        }
    }
}

/// Perform one backend call.
async fn execute(backend: &dyn Backend, call: Call) -> Completion {
    match call {
        Call::Summarize(request) => Completion::Summarize(backend.summarize(request).await),
        Call::Scan(query) => Completion::Scan(backend.reputation_scan(query).await),
        Call::Dns(query) => Completion::Dns(backend.dns_reputation(query).await),
        Call::Upload(request) => Completion::Upload(backend.upload_and_extract(request).await),
        Call::Aggregate(request) => Completion::Aggregate(backend.aggregate(request).await),
    }
}
