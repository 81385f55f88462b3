//! The reactive triage pipeline.
//!
//! `orchestrator` decides which backend calls follow from each user edit and
//! each response, `runtime` runs those calls on tokio and feeds the results
//! back.

pub mod aggregator;
pub mod fence;
pub mod orchestrator;
pub mod runtime;
pub mod stores;

pub use orchestrator::Input;
pub use runtime::{Pipeline, PipelineOptions};
