//! Typed download failures.

use std::io;

/// Every way a download can fail. All variants guarantee that no partial
/// file was left behind.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported URL scheme '{0}'; only http and https are allowed")]
    UnsupportedScheme(String),

    /// Non-success, non-redirect HTTP status.
    #[error("server returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Redirect response without a `Location` header.
    #[error("redirect (HTTP {status}) from {url} has no location")]
    Redirect { status: u16, url: String },

    #[error("gave up after following {limit} redirects")]
    TooManyRedirects { limit: u32 },

    #[error("download exceeded the {limit}-byte size limit")]
    SizeExceeded { limit: u64 },

    /// Connection, DNS, TLS or mid-stream read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Writing the local file failed.
    #[error("failed to write download: {0}")]
    Io(#[from] io::Error),
}

impl FetchError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } | FetchError::Redirect { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}
