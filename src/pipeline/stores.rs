//! Indicator, result and error state owned by the orchestrator.

use crate::models::{
    DisplayedSummary, Field, Group, IndicatorSnapshot, ResultRecord, ScanQuery, SelectedFile,
    SummarySource,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Current user input. Any string is accepted as-is.
#[derive(Debug, Default)]
pub struct IndicatorStore {
    text: String,
    hash: String,
    url: String,
    ip: String,
    domain: String,
    file: Option<SelectedFile>,
}

impl IndicatorStore {
    /// Overwrite a field unconditionally.
    pub fn set(&mut self, field: Field, value: String) {
        debug!("Indicator {} set ({} chars)", field, value.len());
        *self.slot_mut(field) = value;
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Text => &self.text,
            Field::Hash => &self.hash,
            Field::Url => &self.url,
            Field::Ip => &self.ip,
            Field::Domain => &self.domain,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Text => &mut self.text,
            Field::Hash => &mut self.hash,
            Field::Url => &mut self.url,
            Field::Ip => &mut self.ip,
            Field::Domain => &mut self.domain,
        }
    }

    pub fn select_file(&mut self, file: SelectedFile) {
        debug!("Selected file {} ({} bytes)", file.name, file.bytes.len());
        self.file = Some(file);
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    /// The scan query for the current hash, URL and IP values.
    pub fn scan_query(&self) -> Option<ScanQuery> {
        ScanQuery::from_fields(&self.hash, &self.url, &self.ip)
    }

    pub fn snapshot(&self) -> IndicatorSnapshot {
        IndicatorSnapshot {
            text: self.text.clone(),
            hash: self.hash.clone(),
            url: self.url.clone(),
            ip: self.ip.clone(),
            domain: self.domain.clone(),
            file_name: self.file.as_ref().map(|f| f.name.clone()),
            file_size: self.file.as_ref().map(|f| f.bytes.len()),
        }
    }
}

/// Latest applied backend results.
#[derive(Debug, Default)]
pub struct ResultStore {
    displayed: Option<DisplayedSummary>,
    scan: Option<ResultRecord>,
    dns: Option<ResultRecord>,
    upload: Option<ResultRecord>,
}

impl ResultStore {
    pub fn displayed_summary(&self) -> Option<&DisplayedSummary> {
        self.displayed.as_ref()
    }

    /// Replace the displayed summary slot.
    pub fn show_summary(&mut self, source: SummarySource, text: String) {
        if let Some(previous) = &self.displayed {
            if previous.source != source {
                debug!(
                    "Displayed summary switches from {} to {}",
                    previous.source, source
                );
            }
        }
        self.displayed = Some(DisplayedSummary { source, text });
    }

    pub fn scan(&self) -> Option<&ResultRecord> {
        self.scan.as_ref()
    }

    pub fn dns(&self) -> Option<&ResultRecord> {
        self.dns.as_ref()
    }

    pub fn upload(&self) -> Option<&ResultRecord> {
        self.upload.as_ref()
    }

    /// Store a scan record. Returns whether the stored value changed.
    pub fn set_scan(&mut self, record: ResultRecord) -> bool {
        replace(&mut self.scan, record)
    }

    pub fn set_dns(&mut self, record: ResultRecord) -> bool {
        replace(&mut self.dns, record)
    }

    pub fn set_upload(&mut self, record: ResultRecord) -> bool {
        replace(&mut self.upload, record)
    }

    /// Whether any of the aggregation feeders holds a result.
    pub fn has_feeder_result(&self) -> bool {
        self.scan.is_some() || self.dns.is_some() || self.upload.is_some()
    }
}

fn replace(slot: &mut Option<ResultRecord>, record: ResultRecord) -> bool {
    let changed = slot.as_ref() != Some(&record);
    *slot = Some(record);
    changed
}

/// Process-wide error state.
///
/// `current` is a single last-write-wins slot: any failure overwrites it and
/// any success clears it, whichever group reported. `by_group` additionally
/// keeps each group's own latest error until that group succeeds.
#[derive(Debug, Default)]
pub struct ErrorChannel {
    last: Option<String>,
    by_group: BTreeMap<Group, String>,
}

impl ErrorChannel {
    pub fn fail(&mut self, group: Group, message: impl Into<String>) {
        let message = message.into();
        warn!("{} failed: {}", group, message);
        self.by_group.insert(group, message.clone());
        self.last = Some(message);
    }

    pub fn succeed(&mut self, group: Group) {
        self.by_group.remove(&group);
        self.last = None;
    }

    pub fn current(&self) -> Option<&str> {
        self.last.as_deref()
    }

    pub fn by_group(&self) -> &BTreeMap<Group, String> {
        &self.by_group
    }
}
