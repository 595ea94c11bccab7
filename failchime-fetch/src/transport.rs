//! The wire seam under the fetcher.
//!
//! [`HttpTransport`] performs a single GET without following redirects and
//! hands back the status, the `Location` header and a streaming body.

use std::io::Read;
use ureq::Agent;
use url::Url;

/// A response whose body has not been read yet.
pub struct TransportResponse {
    pub status: u16,
    pub location: Option<String>,
    /// Declared `Content-Length`, if the server sent one
    pub content_length: Option<u64>,
    pub body: Box<dyn Read + Send>,
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("location", &self.location)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Connection-level failure (DNS, refused, reset, TLS).
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Issues a single GET request.
pub trait HttpTransport: Send + Sync {
    fn get(&self, url: &Url) -> Result<TransportResponse, TransportError>;
}

/// Production transport backed by a ureq agent.
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            agent: crate::http::agent(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for UreqTransport {
    fn get(&self, url: &Url) -> Result<TransportResponse, TransportError> {
        let response = self
            .agent
            .get(url.as_str())
            .header("User-Agent", crate::http::USER_AGENT)
            .call()
            .map_err(|e| TransportError(format!("request to '{}' failed: {}", url, e)))?;

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get("location")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let content_length = response.body().content_length();
        let body = response.into_body().into_reader();

        Ok(TransportResponse {
            status,
            location,
            content_length,
            body: Box::new(body),
        })
    }
}
