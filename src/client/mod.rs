//! Backend client modules.
//!
//! This module provides the typed seam to the analysis backends and its
//! HTTP implementation.

pub mod backend;
pub mod error;
pub mod http;

pub use backend::{
    AggregateRequest, AggregateResponse, Backend, DnsQuery, ReputationResponse,
    SummarizeRequest, SummarizeResponse, UploadRequest, UploadResponse,
};
pub use error::ClientError;
pub use http::HttpBackend;
