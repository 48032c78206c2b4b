use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = "devnexus";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("{0}")]
    Unreachable(String),
}

/// A single outbound request. Bodies are always JSON.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and raw body of a completed exchange. Non-2xx is still `Ok`.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    /// Reason phrase for the status, empty when the code has none.
    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }
}

/// Seam between the API clients and the network.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform one request/response exchange. Only failures that produce no
    /// response at all are returned as `Err`.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Production transport backed by reqwest, using its default timeout policy.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .header("User-Agent", USER_AGENT);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(method = %request.method, status = status.as_u16(), body_bytes = body.len(), "http exchange complete");
        Ok(HttpResponse { status, body })
    }
}
