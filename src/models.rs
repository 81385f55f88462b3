//! Data models for indicator triage.
//!
//! This module contains the core data structures shared by the pipeline,
//! the backend client and the report generator: indicator fields, derived
//! scan queries, per-feeder result records and report snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Placeholder shown when a backend response carries no summary.
pub const NO_SUMMARY: &str = "No summary available";

/// One of the five user-editable text indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Free text for the language-model summarizer
    Text,
    /// File hash (md5, sha1, sha256; not validated)
    Hash,
    /// URL
    Url,
    /// IP address
    Ip,
    /// Domain name
    Domain,
}

impl Field {
    pub const ALL: [Field; 5] = [Field::Text, Field::Hash, Field::Url, Field::Ip, Field::Domain];

    /// Returns the group an edit of this field re-triggers, if any.
    pub fn trigger(&self) -> Option<Group> {
        match self {
            Field::Hash | Field::Url | Field::Ip => Some(Group::Scan),
            Field::Domain => Some(Group::Dns),
            Field::Text => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Text => write!(f, "text"),
            Field::Hash => write!(f, "hash"),
            Field::Url => write!(f, "url"),
            Field::Ip => write!(f, "ip"),
            Field::Domain => write!(f, "domain"),
        }
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "input" => Ok(Field::Text),
            "hash" | "filehash" | "file_hash" => Ok(Field::Hash),
            "url" => Ok(Field::Url),
            "ip" => Ok(Field::Ip),
            "domain" => Ok(Field::Domain),
            other => Err(format!("unknown field: {}", other)),
        }
    }
}

/// A unit of request fencing: the four feeders plus the final aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Gpt,
    Scan,
    Dns,
    Upload,
    Aggregate,
}

impl Group {
    pub const COUNT: usize = 5;

    pub const ALL: [Group; Group::COUNT] = [
        Group::Gpt,
        Group::Scan,
        Group::Dns,
        Group::Upload,
        Group::Aggregate,
    ];

    /// Stable slot index for arena-style per-group tables.
    pub fn index(&self) -> usize {
        match self {
            Group::Gpt => 0,
            Group::Scan => 1,
            Group::Dns => 2,
            Group::Upload => 3,
            Group::Aggregate => 4,
        }
    }

    /// Human label used in error messages and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Group::Gpt => "GPT summary",
            Group::Scan => "reputation scan",
            Group::Dns => "DNS reputation",
            Group::Upload => "file upload",
            Group::Aggregate => "final summary",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Lifecycle of a group's latest issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupState {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// A file chosen for upload. Selecting it issues nothing.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Reputation lookup for the file hash, URL and IP fields, sent together.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanQuery {
    #[serde(rename = "fileHash", skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

impl ScanQuery {
    /// Build a query from raw field values; `None` when all three are empty.
    pub fn from_fields(hash: &str, url: &str, ip: &str) -> Option<Self> {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        let query = Self {
            hash: non_empty(hash),
            url: non_empty(url),
            ip: non_empty(ip),
        };

        if query.hash.is_none() && query.url.is_none() && query.ip.is_none() {
            None
        } else {
            Some(query)
        }
    }
}

/// Latest applied response of one feeder. Replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Raw structured result as returned by the backend.
    pub raw: Value,
    /// Human-readable summary, if the backend sent one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Error string echoed alongside a partial result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultRecord {
    pub fn new(raw: Value, summary: Option<String>, error: Option<String>) -> Self {
        Self {
            raw,
            summary: summary.filter(|s| !s.is_empty()),
            error: error.filter(|e| !e.is_empty()),
        }
    }

    /// Summary text for display, falling back to the placeholder.
    pub fn display_summary(&self) -> &str {
        self.summary.as_deref().unwrap_or(NO_SUMMARY)
    }

    /// Pretty-printed raw result; empty for a null result.
    pub fn raw_pretty(&self) -> String {
        if self.raw.is_null() {
            return String::new();
        }
        serde_json::to_string_pretty(&self.raw).unwrap_or_else(|_| self.raw.to_string())
    }
}

/// Where the text in the displayed summary slot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    /// An explicit summarize request.
    Gpt,
    /// The metadata summary of a file upload.
    UploadMetadata,
}

impl fmt::Display for SummarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummarySource::Gpt => write!(f, "GPT"),
            SummarySource::UploadMetadata => write!(f, "upload metadata"),
        }
    }
}

/// The displayed summary slot, shared by summarize and upload responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayedSummary {
    pub source: SummarySource,
    pub text: String,
}

/// Indicator values at snapshot time. File contents are reduced to name and size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub text: String,
    pub hash: String,
    pub url: String,
    pub ip: String,
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<usize>,
}

impl IndicatorSnapshot {
    /// Returns the value of a text field.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Text => &self.text,
            Field::Hash => &self.hash,
            Field::Url => &self.url,
            Field::Ip => &self.ip,
            Field::Domain => &self.domain,
        }
    }
}

/// Everything the pipeline currently shows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub indicators: IndicatorSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displayed_summary: Option<DisplayedSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<ResultRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<ResultRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<ResultRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_summary: Option<String>,
    /// The shared last-error slot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Per-group errors, each cleared by that group's own success.
    #[serde(default)]
    pub errors_by_group: BTreeMap<Group, String>,
    #[serde(default)]
    pub groups: BTreeMap<Group, GroupState>,
}

/// Request accounting for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Backend calls issued.
    pub issued: u64,
    /// Responses applied to state.
    pub applied: u64,
    /// Responses dropped because a newer request of the same group was issued.
    pub discarded: u64,
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub backend_url: String,
    pub duration_seconds: f64,
    pub stats: PipelineStats,
}

/// The complete triage report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub snapshot: Snapshot,
}
