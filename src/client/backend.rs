//! Request and response types for the five backend capabilities, and the
//! `Backend` trait the pipeline calls through.

use crate::client::error::ClientError;
use crate::models::ScanQuery;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Free text for the language-model summarizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummarizeRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct SummarizeResponse {
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// DNS reputation lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsQuery {
    pub domain: String,
}

/// Response shared by the scan and DNS reputation endpoints.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ReputationResponse {
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A file sent for metadata extraction.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("file_name", &self.file_name)
            .field("size", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub metadata: Value,
    #[serde(default, alias = "metadataSummary")]
    pub metadata_summary: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The three feeder summaries combined into the final brief. Any may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AggregateRequest {
    #[serde(rename = "file_metadata_summary")]
    pub file_summary: String,
    #[serde(rename = "vt_scan_result")]
    pub scan_summary: String,
    #[serde(rename = "vt_dns_result")]
    pub dns_summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct AggregateResponse {
    #[serde(default)]
    pub summary: Option<String>,
}

/// The analysis backends. Every call is independent and may fail; nothing is
/// retried.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn summarize(&self, request: SummarizeRequest)
        -> Result<SummarizeResponse, ClientError>;

    async fn reputation_scan(&self, query: ScanQuery)
        -> Result<ReputationResponse, ClientError>;

    async fn dns_reputation(&self, query: DnsQuery) -> Result<ReputationResponse, ClientError>;

    async fn upload_and_extract(
        &self,
        request: UploadRequest,
    ) -> Result<UploadResponse, ClientError>;

    async fn aggregate(&self, request: AggregateRequest)
        -> Result<AggregateResponse, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCAN_FIXTURE: &str = r#"{
        "result": {"data": {"attributes": {"last_analysis_stats": {"malicious": 3, "harmless": 60}}}},
        "summary": "3 engines flag this hash as malicious"
    }"#;

    const UPLOAD_FIXTURE: &str = r#"{
        "metadata": {"size": 1024, "mime": "application/pdf"},
        "metadata_summary": "PDF document"
    }"#;

    #[test]
    fn test_parse_reputation_response() {
        let resp: ReputationResponse = serde_json::from_str(SCAN_FIXTURE).unwrap();
        assert_eq!(
            resp.result["data"]["attributes"]["last_analysis_stats"]["malicious"],
            3
        );
        assert_eq!(
            resp.summary.as_deref(),
            Some("3 engines flag this hash as malicious")
        );
        assert_eq!(resp.error, None);
    }

    #[test]
    fn test_parse_reputation_error_only() {
        let resp: ReputationResponse =
            serde_json::from_str(r#"{"error": "Error fetching VirusTotal scan result"}"#).unwrap();
        assert!(resp.result.is_null());
        assert_eq!(resp.summary, None);
        assert_eq!(
            resp.error.as_deref(),
            Some("Error fetching VirusTotal scan result")
        );
    }

    #[test]
    fn test_parse_upload_response_both_spellings() {
        let resp: UploadResponse = serde_json::from_str(UPLOAD_FIXTURE).unwrap();
        assert_eq!(resp.metadata["size"], 1024);
        assert_eq!(resp.metadata_summary.as_deref(), Some("PDF document"));

        let resp: UploadResponse =
            serde_json::from_str(r#"{"metadata": {}, "metadataSummary": "ELF binary"}"#).unwrap();
        assert_eq!(resp.metadata_summary.as_deref(), Some("ELF binary"));
    }

    #[test]
    fn test_aggregate_request_wire_names() {
        let request = AggregateRequest {
            file_summary: String::new(),
            scan_summary: "clean".to_string(),
            dns_summary: String::new(),
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "file_metadata_summary": "",
                "vt_scan_result": "clean",
                "vt_dns_result": ""
            })
        );
    }

    #[test]
    fn test_parse_summarize_response_missing_fields() {
        let resp: SummarizeResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.result, "");
        assert_eq!(resp.error, None);
    }
}
