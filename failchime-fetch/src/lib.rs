//! Download of user-supplied alert sounds.
//!
//! Only `http`/`https` URLs are accepted. Redirects are followed a bounded
//! number of times, the body is capped at a byte limit while streaming, and
//! a failed transfer never leaves a file behind.

pub mod error;
pub mod fetcher;
pub mod http;
pub mod transport;

pub use error::FetchError;
pub use fetcher::{DEFAULT_EXTENSION, FetchLimits, Fetcher, destination_file_name};
pub use http::{USER_AGENT, parse_download_url};
pub use transport::{HttpTransport, TransportError, TransportResponse, UreqTransport};
