//! HTTP transport seam for the portal session
//!
//! The session core talks to the portal through the [`Transport`] trait so
//! tests can substitute a scripted transport. The production implementation
//! wraps a `reqwest::Client` that never follows redirects (the login chain
//! is handled manually) and never manages cookies itself; the session owns
//! the jar.

use crate::{Result, WatchError};
use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Duration;

/// Request methods the portal requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A transport-level request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,

    /// When set, a non-2xx status is not an error. The login redirect chain
    /// legitimately answers with non-2xx statuses.
    pub ignore_status: bool,
}

impl TransportRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            headers: Vec::new(),
            body: None,
            ignore_status: false,
        }
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Post,
            headers: vec![(
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            )],
            body: Some(body.into()),
            ignore_status: false,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn ignoring_status(mut self) -> Self {
        self.ignore_status = true;
        self
    }
}

/// A transport-level response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub content: String,
    pub headers: Vec<(String, String)>,
}

impl TransportResponse {
    /// First header with the given name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All `Set-Cookie` values combined into the single chained form the
    /// cookie scanner expects.
    pub fn set_cookie(&self) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .iter()
            .filter(|(header, _)| header.eq_ignore_ascii_case("set-cookie"))
            .map(|(_, value)| value.as_str())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }
}

/// Performs portal HTTP requests.
///
/// Contract: never follow redirects; never fail on a non-2xx status when
/// `ignore_status` is set; surface "no response" and "no data" as
/// distinguishable failures.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Production transport over `reqwest`.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("schulnetz-watch/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::none())
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| WatchError::NoResponse {
            url: request.url.clone(),
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let content = response.text().await.map_err(|e| WatchError::NoResponse {
            url: request.url.clone(),
            message: e.to_string(),
        })?;

        if !request.ignore_status && !(200..300).contains(&status) {
            return Err(WatchError::Status {
                url: request.url,
                status,
            });
        }
        if !request.ignore_status && content.is_empty() {
            return Err(WatchError::NoData { url: request.url });
        }

        Ok(TransportResponse {
            status,
            content,
            headers,
        })
    }
}
