//! Wire transport underneath [`HttpClient`](crate::api::client::HttpClient).

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::api::request::{ApiRequest, Method};

/// Response as read off the wire, before any parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    /// Lower-cased header names.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// The backend could not be reached at all.
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Other(String),
}

#[async_trait(?Send)]
pub trait Transport: Send + Sync {
    async fn send(&self, url: &str, request: &ApiRequest) -> Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport. Timeouts are enforced by the client, not here.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("crm-frontend/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_error(err: reqwest::Error) -> TransportError {
    if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    async fn send(&self, url: &str, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .http
            .request(to_reqwest_method(request.method), url)
            .query(&request.query);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_error)?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(map_error)?;

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}
