//! HTTP implementation of the backend capabilities.
//!
//! All five operations are JSON `POST`s against configurable routes, except
//! the upload which sends a multipart form with a single `file` part.

use crate::client::backend::{
    AggregateRequest, AggregateResponse, Backend, DnsQuery, ReputationResponse,
    SummarizeRequest, SummarizeResponse, UploadRequest, UploadResponse,
};
use crate::client::error::ClientError;
use crate::config::BackendConfig;
use crate::models::ScanQuery;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Backend client speaking JSON over HTTP.
pub struct HttpBackend {
    http: reqwest::Client,
    config: BackendConfig,
}

impl HttpBackend {
    /// Create a client for the configured backend.
    pub fn new(config: BackendConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { http, config })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.config.url
    }

    fn endpoint(&self, route: &str) -> String {
        join_url(&self.config.url, route)
    }

    async fn post_json<B, R>(&self, route: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint(route);
        debug!("POST {}", url);

        let response = self.http.post(&url).json(body).send().await?;
        let response = check_response(response).await?;

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn summarize(
        &self,
        request: SummarizeRequest,
    ) -> Result<SummarizeResponse, ClientError> {
        self.post_json(&self.config.routes.summarize, &request).await
    }

    async fn reputation_scan(
        &self,
        query: ScanQuery,
    ) -> Result<ReputationResponse, ClientError> {
        self.post_json(&self.config.routes.scan, &query).await
    }

    async fn dns_reputation(&self, query: DnsQuery) -> Result<ReputationResponse, ClientError> {
        self.post_json(&self.config.routes.dns, &query).await
    }

    async fn upload_and_extract(
        &self,
        request: UploadRequest,
    ) -> Result<UploadResponse, ClientError> {
        let url = self.endpoint(&self.config.routes.upload);
        debug!(
            "POST {} (multipart, {} bytes)",
            url,
            request.bytes.len()
        );

        let part = Part::bytes(request.bytes).file_name(request.file_name);
        let form = Form::new().part("file", part);

        let response = self.http.post(&url).multipart(form).send().await?;
        let response = check_response(response).await?;

        Ok(response.json().await?)
    }

    async fn aggregate(
        &self,
        request: AggregateRequest,
    ) -> Result<AggregateResponse, ClientError> {
        self.post_json(&self.config.routes.aggregate, &request).await
    }
}

/// Join a base URL and a route with exactly one slash between them.
fn join_url(base: &str, route: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        route.trim_start_matches('/')
    )
}

/// Map a non-success status to [`ClientError::Service`].
pub async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Service {
        status: status.as_u16(),
        message: service_message(&body),
    })
}

/// Extract `error` or `detail` from a JSON error body, else the raw body.
fn service_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("error")
            .or_else(|| v.get("detail"))
            .and_then(|m| m.as_str())
            .map(String::from)
    });

    from_json.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "empty response body".to_string()
        } else {
            trimmed.to_string()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_response(status: u16, body: &'static str) -> reqwest::Response {
        reqwest::Response::from(
            ::http::Response::builder()
                .status(status)
                .body(body)
                .unwrap(),
        )
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://localhost:8000", "/vt/scan"),
            "http://localhost:8000/vt/scan"
        );
        assert_eq!(
            join_url("http://localhost:8000/", "vt/dns"),
            "http://localhost:8000/vt/dns"
        );
        assert_eq!(
            join_url("https://triage.internal/api/", "/upload"),
            "https://triage.internal/api/upload"
        );
    }

    #[test]
    fn test_service_message() {
        assert_eq!(
            service_message(r#"{"error": "Error uploading and scanning file"}"#),
            "Error uploading and scanning file"
        );
        assert_eq!(
            service_message(r#"{"detail": "No valid parameter provided"}"#),
            "No valid parameter provided"
        );
        assert_eq!(service_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(service_message("  "), "empty response body");
    }

    #[tokio::test]
    async fn test_check_response_success_passes_through() {
        let resp = check_response(mock_response(200, r#"{"summary": "ok"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_check_response_maps_failure_to_service_error() {
        let err = check_response(mock_response(
            500,
            r#"{"error": "Error fetching VirusTotal scan result"}"#,
        ))
        .await
        .unwrap_err();

        assert_eq!(
            err,
            ClientError::Service {
                status: 500,
                message: "Error fetching VirusTotal scan result".to_string(),
            }
        );
    }

    #[test]
    fn test_new_client_keeps_base_url() {
        let backend = HttpBackend::new(BackendConfig::default()).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.endpoint("/gpt"), "http://localhost:8000/gpt");
    }
}
